//! DTOs describing short URL records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::ShortUrl;

/// JSON representation of a short URL record.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub click_count: i64,
}

impl UrlResponse {
    /// Builds the response, prefixing the code with `base_url`.
    pub fn from_entity(url: ShortUrl, base_url: &str) -> Self {
        Self {
            short_url: format!("{}/{}", base_url, url.short_code),
            id: url.id,
            short_code: url.short_code,
            original_url: url.original_url,
            owner_id: url.owner_id,
            created_at: url.created_at,
            expires_at: url.expires_at,
            is_active: url.is_active,
            click_count: url.click_count,
        }
    }
}

/// Owner listing response.
#[derive(Debug, Serialize)]
pub struct UrlListResponse {
    pub total: usize,
    pub items: Vec<UrlResponse>,
}
