//! DTOs for short URL creation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

/// Request to shorten a single URL.
///
/// Used by both `POST /api/shorten` and `POST /api/urls`.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The original URL (must be an absolute HTTP/HTTPS URL).
    #[validate(
        length(min = 1, max = 2048, message = "URL must be 1-2048 characters"),
        url(message = "Invalid URL format")
    )]
    pub url: String,

    /// Optional expiry. After this instant the short link answers 410 Gone.
    pub expires_at: Option<DateTime<Utc>>,
}
