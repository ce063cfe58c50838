//! Short URL entity and its read-time visibility rules.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A short code mapped to an original URL.
///
/// `is_active` only ever goes from `true` to `false` (soft delete). Expiry is
/// not stored as state: it is evaluated against the clock on every read, see
/// [`ShortUrl::visibility`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortUrl {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub click_count: i64,
}

/// How a record looks to a redirect lookup at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Expired,
    Gone,
}

impl ShortUrl {
    /// Returns true if the record has an expiry at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Evaluates the record's visibility.
    ///
    /// Inactive wins over expired: a deleted record is gone even if it also
    /// expired.
    pub fn visibility(&self, now: DateTime<Utc>) -> Visibility {
        if !self.is_active {
            Visibility::Gone
        } else if self.is_expired_at(now) {
            Visibility::Expired
        } else {
            Visibility::Visible
        }
    }
}

/// Input data for persisting a new short URL.
///
/// Storage assigns `id`; `is_active` starts `true` and `click_count` at zero.
#[derive(Debug, Clone)]
pub struct NewShortUrl {
    pub short_code: String,
    pub original_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(expires_at: Option<DateTime<Utc>>, is_active: bool) -> ShortUrl {
        ShortUrl {
            id: 1,
            short_code: "abc123".to_string(),
            original_url: "https://example.com".to_string(),
            owner_id: None,
            created_at: Utc::now(),
            expires_at,
            is_active,
            click_count: 0,
        }
    }

    #[test]
    fn test_visible_without_expiry() {
        let url = sample(None, true);
        assert_eq!(url.visibility(Utc::now()), Visibility::Visible);
    }

    #[test]
    fn test_visible_with_future_expiry() {
        let url = sample(Some(Utc::now() + Duration::hours(1)), true);
        assert_eq!(url.visibility(Utc::now()), Visibility::Visible);
    }

    #[test]
    fn test_expired_at_exact_boundary() {
        let now = Utc::now();
        let url = sample(Some(now), true);
        assert!(url.is_expired_at(now));
        assert_eq!(url.visibility(now), Visibility::Expired);
    }

    #[test]
    fn test_inactive_is_gone_even_when_expired() {
        let url = sample(Some(Utc::now() - Duration::seconds(1)), false);
        assert_eq!(url.visibility(Utc::now()), Visibility::Gone);
    }
}
