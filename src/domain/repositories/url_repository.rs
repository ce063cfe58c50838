//! Repository trait for short URL storage.

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for short URL records.
///
/// Records are reachable by numeric id, short code and owner id. The
/// repository never removes rows: deletion is a flip of `is_active`.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryUrlRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Persists a new record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code already exists, active
    /// or not. Existing records are never overwritten.
    ///
    /// Returns [`AppError::Unavailable`] on storage errors.
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError>;

    /// Finds a record by short code regardless of its state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] on storage errors.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError>;

    /// Lists active records owned by `owner_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] on storage errors.
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<ShortUrl>, AppError>;

    /// Sets `is_active = false` on the active record matching both `id` and `owner_id`.
    ///
    /// Returns the number of affected rows: `0` when the record does not
    /// exist, belongs to someone else, or is already inactive.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] on storage errors.
    async fn deactivate(&self, id: i64, owner_id: &str) -> Result<u64, AppError>;

    /// Atomically adds one to `click_count`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] on storage errors.
    async fn increment_click_count(&self, id: i64) -> Result<(), AppError>;

    /// Checks that storage is reachable. Used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
