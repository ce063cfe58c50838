//! Short URL lifecycle: creation, resolution, listing, soft deletion and click recording.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::click_worker::ClickSender;
use crate::domain::entities::{NewShortUrl, ShortUrl, Visibility};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::utils::code_generator::generate_code;
use crate::utils::url_validator::validate_url;

/// Maximum number of short codes tried before giving up on a creation.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Service owning the short URL lifecycle.
///
/// Uniqueness of short codes is enforced by storage; this service only reacts
/// to a reported collision by drawing a new code. Expiry is evaluated on every
/// read and never written back.
pub struct UrlService<R: UrlRepository + ?Sized> {
    repository: Arc<R>,
    clicks: ClickSender,
}

impl<R: UrlRepository + ?Sized> UrlService<R> {
    /// Creates a new URL service.
    pub fn new(repository: Arc<R>, clicks: ClickSender) -> Self {
        Self { repository, clicks }
    }

    /// Creates a short URL with a freshly generated code.
    ///
    /// # Code Generation
    ///
    /// Draws a random code and lets storage enforce uniqueness. On a
    /// [`AppError::Conflict`] a new code is drawn, up to
    /// [`MAX_CODE_ATTEMPTS`] times in total.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `original_url` is not an absolute
    /// HTTP(S) URL. Nothing is written in that case.
    ///
    /// Returns [`AppError::ResourceExhausted`] if every attempt collided.
    ///
    /// Returns [`AppError::Unavailable`] on storage errors.
    pub async fn create_short_url(
        &self,
        original_url: &str,
        owner_id: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortUrl, AppError> {
        let original_url = validate_url(original_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let new_url = NewShortUrl {
                short_code: generate_code(),
                original_url: original_url.clone(),
                owner_id: owner_id.clone(),
                created_at: Utc::now(),
                expires_at,
            };

            match self.repository.create(new_url).await {
                Ok(url) => {
                    info!(
                        id = url.id,
                        short_code = %url.short_code,
                        owner = url.owner_id.as_deref().unwrap_or("anonymous"),
                        "Short URL created"
                    );
                    return Ok(url);
                }
                Err(AppError::Conflict { .. }) => {
                    warn!(attempt, "Short code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::resource_exhausted(
            "Failed to generate unique short code",
            json!({ "attempts": MAX_CODE_ATTEMPTS }),
        ))
    }

    /// Resolves a short code to a visible record.
    ///
    /// Read-only: click counts are recorded separately with
    /// [`Self::record_click`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code was never issued or the
    /// record was deleted. The two cases are indistinguishable.
    ///
    /// Returns [`AppError::Expired`] if the record is active but its expiry
    /// is at or before now.
    pub async fn get_url(&self, short_code: &str) -> Result<ShortUrl, AppError> {
        let not_found =
            || AppError::not_found("Short URL not found", json!({ "short_code": short_code }));

        let url = self
            .repository
            .find_by_code(short_code)
            .await?
            .ok_or_else(not_found)?;

        match url.visibility(Utc::now()) {
            Visibility::Visible => Ok(url),
            Visibility::Gone => Err(not_found()),
            Visibility::Expired => Err(AppError::expired(
                "Short URL has expired",
                json!({ "short_code": short_code, "expires_at": url.expires_at }),
            )),
        }
    }

    /// Schedules a click increment for `id` and returns immediately.
    ///
    /// Best effort: when the click queue is full or closed the click is
    /// dropped and logged. Never fails the caller.
    pub fn record_click(&self, id: i64) {
        if self.clicks.send(ClickEvent::new(id)) {
            debug!(url_id = id, "Click queued");
        }
    }

    /// Lists the owner's active records, newest first.
    ///
    /// Expired records are included so their owner can still manage them.
    pub async fn list_user_urls(&self, owner_id: &str) -> Result<Vec<ShortUrl>, AppError> {
        self.repository.find_by_owner(owner_id).await
    }

    /// Soft-deletes a record owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when the record does not exist, belongs
    /// to another owner, or is already deleted. Existence of other owners'
    /// records is never disclosed.
    pub async fn delete_url(&self, id: i64, owner_id: &str) -> Result<(), AppError> {
        let affected = self.repository.deactivate(id, owner_id).await?;

        if affected == 0 {
            return Err(AppError::not_found(
                "Short URL not found",
                json!({ "id": id }),
            ));
        }

        info!(id, owner = owner_id, "Short URL deactivated");
        Ok(())
    }

    /// Checks that storage is reachable.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }
}
