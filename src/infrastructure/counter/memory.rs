//! In-memory counter store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::repositories::CounterStore;
use crate::error::AppError;

/// Expired entries are swept after this many increments.
const SWEEP_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: i64,
    expires_at: Instant,
}

/// Per-process counter store.
///
/// Counters are not shared between instances, so limits only hold per
/// process. Used in tests and as a fallback when Redis is not configured.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    entries: DashMap<String, Entry>,
    ops: AtomicU64,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live and not yet swept keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sweep(&self, now: Instant) {
        self.entries.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, AppError> {
        let now = Instant::now();

        let count = {
            let mut entry = self.entries.entry(key.to_string()).or_insert(Entry {
                count: 0,
                expires_at: now + ttl,
            });

            if entry.expires_at <= now {
                entry.count = 0;
                entry.expires_at = now + ttl;
            }

            entry.count += 1;
            entry.count
        };

        if self.ops.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep(now);
        }

        Ok(count)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
