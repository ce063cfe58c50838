//! Redis-backed counter store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use serde_json::json;
use tracing::info;

use crate::domain::repositories::CounterStore;
use crate::error::AppError;

/// Increments the key and arms its expiry on first write, as one atomic unit.
const INCREMENT_WITH_EXPIRY: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], tonumber(ARGV[1]))
end
return current
"#;

/// Counter store shared by every instance pointing at the same Redis.
pub struct RedisCounterStore {
    conn: ConnectionManager,
    script: Script,
}

impl RedisCounterStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] if the URL is invalid, the connection
    /// is not established within `connect_timeout`, or the PING fails.
    pub async fn connect(redis_url: &str, connect_timeout: Duration) -> Result<Self, AppError> {
        let client = Client::open(redis_url)?;

        let conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                AppError::unavailable(
                    "Redis connection timed out",
                    json!({ "timeout_secs": connect_timeout.as_secs() }),
                )
            })??;

        let mut probe = conn.clone();
        probe.ping::<()>().await?;

        info!("✓ Connected to Redis counter store");

        Ok(Self {
            conn,
            script: Script::new(INCREMENT_WITH_EXPIRY),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, AppError> {
        let mut conn = self.conn.clone();

        let count: i64 = self
            .script
            .key(key)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut conn)
            .await?;

        Ok(count)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
