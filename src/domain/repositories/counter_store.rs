//! Counter store contract consumed by the rate limiter.

use crate::error::AppError;
use async_trait::async_trait;
use std::time::Duration;

/// Shared atomic counter store.
///
/// The only operation the rate limiter needs is an increment that also arms
/// the key's expiry on its first write. Both must happen as one atomic unit
/// on the store side: a key created without an expiry would never roll over.
///
/// # Implementations
///
/// - [`crate::infrastructure::counter::RedisCounterStore`] - Redis (shared across instances)
/// - [`crate::infrastructure::counter::InMemoryCounterStore`] - Per-process store for development and tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increments `key` by one and returns the new value.
    ///
    /// When the increment creates the key, its time-to-live is set to `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] if the store cannot be reached.
    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, AppError>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> bool;
}
