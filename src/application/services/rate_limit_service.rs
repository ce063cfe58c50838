//! Fixed-window rate limiting backed by a shared counter store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::client_identity::ClientIdentity;
use crate::domain::repositories::CounterStore;
use crate::error::AppError;

/// Per-window request budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub authenticated_limit: u64,
    pub anonymous_limit: u64,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            authenticated_limit: 10,
            anonymous_limit: 5,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub admitted: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Unix seconds at which the current window ends.
    pub reset_at: i64,
}

impl Admission {
    /// Converts a rejected admission into [`AppError::RateLimited`].
    pub fn into_result(self) -> Result<Self, AppError> {
        if self.admitted {
            Ok(self)
        } else {
            Err(AppError::RateLimited {
                limit: self.limit,
                remaining: self.remaining,
                reset_at: self.reset_at,
            })
        }
    }
}

/// Fixed-window limiter.
///
/// Every attempt is counted, including rejected ones, so hammering a limit
/// never frees budget within the window. Windows are aligned to multiples
/// of the window length since the Unix epoch, which makes the key of a given
/// window identical on every instance sharing the store.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Budget applied to `identity`.
    pub fn limit_for(&self, identity: &ClientIdentity) -> u64 {
        if identity.is_authenticated() {
            self.policy.authenticated_limit
        } else {
            self.policy.anonymous_limit
        }
    }

    /// Counts one attempt for `identity` in the window containing `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] if the counter store fails. The
    /// request is never admitted without a successful count.
    pub async fn admit(
        &self,
        identity: &ClientIdentity,
        now: DateTime<Utc>,
    ) -> Result<Admission, AppError> {
        let window_secs = self.policy.window.as_secs().max(1) as i64;
        let window_index = now.timestamp().div_euclid(window_secs);
        let key = format!("ratelimit:{}:{}", identity, window_index);
        let limit = self.limit_for(identity);

        let count = self
            .store
            .increment_with_expiry(&key, self.policy.window)
            .await
            .inspect_err(|e| warn!(key = %key, error = %e, "Counter store failure"))?;

        let count = count.max(0) as u64;
        let admission = Admission {
            admitted: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_at: (window_index + 1) * window_secs,
        };

        if !admission.admitted {
            debug!(identity = %identity, count, limit, "Rate limit exceeded");
        }

        Ok(admission)
    }

    /// Like [`Self::admit`] but rejects with [`AppError::RateLimited`].
    pub async fn check(&self, identity: &ClientIdentity) -> Result<Admission, AppError> {
        self.admit(identity, Utc::now()).await?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockCounterStore;
    use crate::infrastructure::counter::InMemoryCounterStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn limiter() -> RateLimiter {
        RateLimiter::new(
            Arc::new(InMemoryCounterStore::new()),
            RateLimitPolicy::default(),
        )
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn anon() -> ClientIdentity {
        ClientIdentity::Address("10.0.0.1".to_string())
    }

    fn user() -> ClientIdentity {
        ClientIdentity::Subject("42".to_string())
    }

    #[tokio::test]
    async fn test_anonymous_limit_enforced() {
        let limiter = limiter();
        let now = at(1_200);

        for i in 1..=5 {
            let a = limiter.admit(&anon(), now).await.unwrap();
            assert!(a.admitted);
            assert_eq!(a.remaining, 5 - i);
        }

        let rejected = limiter.admit(&anon(), now).await.unwrap();
        assert!(!rejected.admitted);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.limit, 5);
        assert_eq!(rejected.reset_at, 1_260);
    }

    #[tokio::test]
    async fn test_authenticated_limit_enforced() {
        let limiter = limiter();
        let now = at(1_200);

        for _ in 0..10 {
            assert!(limiter.admit(&user(), now).await.unwrap().admitted);
        }
        assert!(!limiter.admit(&user(), now).await.unwrap().admitted);
    }

    #[tokio::test]
    async fn test_next_window_admits_again() {
        let limiter = limiter();
        let now = at(1_230);

        for _ in 0..6 {
            limiter.admit(&anon(), now).await.unwrap();
        }
        assert!(!limiter.admit(&anon(), now).await.unwrap().admitted);

        let later = limiter.admit(&anon(), at(1_260)).await.unwrap();
        assert!(later.admitted);
        assert_eq!(later.remaining, 4);
        assert_eq!(later.reset_at, 1_320);
    }

    #[tokio::test]
    async fn test_identities_counted_separately() {
        let limiter = limiter();
        let now = at(600);

        for _ in 0..5 {
            limiter.admit(&anon(), now).await.unwrap();
        }
        assert!(!limiter.admit(&anon(), now).await.unwrap().admitted);

        let other = ClientIdentity::Address("10.0.0.2".to_string());
        assert!(limiter.admit(&other, now).await.unwrap().admitted);
        assert!(limiter.admit(&user(), now).await.unwrap().admitted);
    }

    #[tokio::test]
    async fn test_subject_and_address_namespaces_do_not_collide() {
        let limiter = limiter();
        let now = at(600);
        let subject = ClientIdentity::Subject("10.0.0.1".to_string());

        for _ in 0..5 {
            limiter.admit(&anon(), now).await.unwrap();
        }

        let a = limiter.admit(&subject, now).await.unwrap();
        assert!(a.admitted);
        assert_eq!(a.remaining, 9);
    }

    #[tokio::test]
    async fn test_rejected_attempts_are_counted() {
        let limiter = limiter();
        let now = at(0);

        for _ in 0..8 {
            limiter.admit(&anon(), now).await.unwrap();
        }

        let a = limiter.admit(&anon(), now).await.unwrap();
        assert!(!a.admitted);
        assert_eq!(a.remaining, 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_unavailable() {
        let mut store = MockCounterStore::new();
        store
            .expect_increment_with_expiry()
            .returning(|_, _| Err(AppError::unavailable("redis down", json!({}))));

        let limiter = RateLimiter::new(Arc::new(store), RateLimitPolicy::default());
        let result = limiter.admit(&anon(), at(0)).await;

        assert!(matches!(result.unwrap_err(), AppError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_key_and_ttl_passed_to_store() {
        let mut store = MockCounterStore::new();
        store
            .expect_increment_with_expiry()
            .withf(|key, ttl| key == "ratelimit:user:42:20" && *ttl == Duration::from_secs(60))
            .times(1)
            .returning(|_, _| Ok(1));

        let limiter = RateLimiter::new(Arc::new(store), RateLimitPolicy::default());
        let a = limiter.admit(&user(), at(1_234)).await.unwrap();

        assert!(a.admitted);
        assert_eq!(a.remaining, 9);
        assert_eq!(a.reset_at, 1_260);
    }

    #[tokio::test]
    async fn test_into_result_maps_rejection() {
        let rejected = Admission {
            admitted: false,
            limit: 5,
            remaining: 0,
            reset_at: 120,
        };

        match rejected.into_result() {
            Err(AppError::RateLimited {
                limit,
                remaining,
                reset_at,
            }) => {
                assert_eq!(limit, 5);
                assert_eq!(remaining, 0);
                assert_eq!(reset_at, 120);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
