//! Identity resolution contract.

use crate::error::AppError;
use async_trait::async_trait;

/// Turns a bearer credential into a stable subject id.
///
/// Absence of a credential is handled by the caller as "anonymous"; this
/// trait only sees credentials that were actually presented.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the credential is unknown or revoked.
    /// Returns [`AppError::Unavailable`] if the backing store cannot be reached.
    async fn resolve(&self, credential: &str) -> Result<String, AppError>;
}

/// Subject id of an authenticated request, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(pub String);
