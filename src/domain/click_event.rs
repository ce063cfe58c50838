//! Click event model for asynchronous click accounting.

use chrono::{DateTime, Utc};

/// A redirect that should be counted against a short URL.
///
/// Created by the redirect path and handed to the background worker through
/// a bounded channel, so the response never waits on the increment.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub url_id: i64,
    pub clicked_at: DateTime<Utc>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    pub fn new(url_id: i64) -> Self {
        Self {
            url_id,
            clicked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_event_creation() {
        let before = Utc::now();
        let event = ClickEvent::new(42);

        assert_eq!(event.url_id, 42);
        assert!(event.clicked_at >= before);
    }

    #[test]
    fn test_click_event_clone() {
        let event = ClickEvent::new(7);
        let cloned = event.clone();
        assert_eq!(cloned, event);
    }
}
