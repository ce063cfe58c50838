//! Bearer token authentication and subject resolution.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::warn;

use crate::domain::identity::IdentityResolver;
use crate::domain::repositories::TokenRepository;
use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Hashes a raw token with HMAC-SHA256 keyed by `secret`.
///
/// Returns a 64-character lowercase hex-encoded MAC. Shared with the admin
/// CLI so both sides agree on stored hashes.
pub fn hash_token(secret: &str, token: &str) -> String {
    // HMAC accepts keys of any length, so `new_from_slice` cannot fail here.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Resolves API tokens to the subject they were issued for.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before
/// lookup. An attacker with read-only access to the database cannot verify
/// or forge tokens without the server-side secret.
pub struct AuthService<R: TokenRepository + ?Sized> {
    repository: Arc<R>,
    signing_secret: String,
}

impl<R: TokenRepository + ?Sized> AuthService<R> {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `repository` - token repository for DB operations
    /// - `signing_secret` - HMAC key; must match the value used when tokens were created
    pub fn new(repository: Arc<R>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    fn hash_token(&self, token: &str) -> String {
        hash_token(&self.signing_secret, token)
    }
}

#[async_trait]
impl<R: TokenRepository + ?Sized> IdentityResolver for AuthService<R> {
    /// Resolves a raw token to its subject id.
    ///
    /// Updates `last_used_at` on success; a failure there is logged and
    /// does not affect the result.
    async fn resolve(&self, credential: &str) -> Result<String, AppError> {
        let token_hash = self.hash_token(credential);

        let subject = self
            .repository
            .find_subject(&token_hash)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Invalid or revoked token"}),
                )
            })?;

        if let Err(e) = self.repository.update_last_used(&token_hash).await {
            warn!(error = %e, "Failed to update token last_used_at");
        }

        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockTokenRepository;

    fn test_secret() -> String {
        "test-signing-secret".to_string()
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let mut mock_repo = MockTokenRepository::new();

        let token = "valid-token";
        let expected_hash = hash_token(&test_secret(), token);

        mock_repo
            .expect_find_subject()
            .withf(move |hash| hash == expected_hash)
            .times(1)
            .returning(|_| Ok(Some("user-7".to_string())));

        mock_repo
            .expect_update_last_used()
            .times(1)
            .returning(|_| Ok(()));

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let subject = service.resolve(token).await.unwrap();

        assert_eq!(subject, "user-7");
    }

    #[tokio::test]
    async fn test_resolve_invalid_token() {
        let mut mock_repo = MockTokenRepository::new();

        mock_repo
            .expect_find_subject()
            .times(1)
            .returning(|_| Ok(None));
        mock_repo.expect_update_last_used().times(0);

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let result = service.resolve("invalid-token").await;

        assert!(matches!(result.unwrap_err(), AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_resolve_store_failure_is_unavailable() {
        let mut mock_repo = MockTokenRepository::new();

        mock_repo
            .expect_find_subject()
            .returning(|_| Err(AppError::unavailable("db down", json!({}))));

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        let result = service.resolve("any").await;

        assert!(matches!(result.unwrap_err(), AppError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_resolve_ignores_last_used_failure() {
        let mut mock_repo = MockTokenRepository::new();

        mock_repo
            .expect_find_subject()
            .returning(|_| Ok(Some("user-1".to_string())));
        mock_repo
            .expect_update_last_used()
            .returning(|_| Err(AppError::unavailable("db down", json!({}))));

        let service = AuthService::new(Arc::new(mock_repo), test_secret());

        assert_eq!(service.resolve("tok").await.unwrap(), "user-1");
    }

    #[test]
    fn test_hash_token_consistency() {
        let hash1 = hash_token(&test_secret(), "test-token");
        let hash2 = hash_token(&test_secret(), "test-token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_hash_token_different_inputs() {
        assert_ne!(
            hash_token(&test_secret(), "token1"),
            hash_token(&test_secret(), "token2")
        );
    }

    #[test]
    fn test_hash_token_secret_matters() {
        assert_ne!(hash_token("secret-a", "token"), hash_token("secret-b", "token"));
    }
}
