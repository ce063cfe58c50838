//! Application error taxonomy and HTTP mapping.
//!
//! Every core operation returns one of these variants. Handlers never build
//! status codes by hand: the [`IntoResponse`] impl below is the single place
//! where error kinds become transport responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload returned in API responses.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Error kinds surfaced by the URL service, the rate limiter and their collaborators.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed request data. Never worth retrying.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// Missing or invalid bearer credential.
    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    /// No visible record for the key/owner combination. Covers soft-deleted records.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The record exists and is active but its expiry has passed.
    #[error("{message}")]
    Expired { message: String, details: Value },

    /// Storage reported a uniqueness violation.
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Short-code generation ran out of attempts.
    #[error("{message}")]
    ResourceExhausted { message: String, details: Value },

    /// Admission control rejected the request.
    #[error("Rate limit exceeded")]
    RateLimited {
        limit: u64,
        remaining: u64,
        /// Unix timestamp (seconds) at which the current window closes.
        reset_at: i64,
    },

    /// A collaborator (storage, counter store, identity resolver) could not be reached.
    #[error("{message}")]
    Unavailable { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn expired(message: impl Into<String>, details: Value) -> Self {
        Self::Expired {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn resource_exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::ResourceExhausted {
            message: message.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }

    /// Returns the HTTP status code for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Expired { .. } => StatusCode::GONE,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::ResourceExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Converts the error into its serializable payload.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            AppError::Validation { message, details } => {
                ("validation_error", message.clone(), details.clone())
            }
            AppError::Unauthorized { message, details } => {
                ("unauthorized", message.clone(), details.clone())
            }
            AppError::NotFound { message, details } => {
                ("not_found", message.clone(), details.clone())
            }
            AppError::Expired { message, details } => ("expired", message.clone(), details.clone()),
            AppError::Conflict { message, details } => {
                ("conflict", message.clone(), details.clone())
            }
            AppError::ResourceExhausted { message, details } => {
                ("resource_exhausted", message.clone(), details.clone())
            }
            AppError::RateLimited {
                limit,
                remaining,
                reset_at,
            } => (
                "rate_limited",
                self.to_string(),
                json!({ "limit": limit, "remaining": remaining, "reset": reset_at }),
            ),
            AppError::Unavailable { message, details } => {
                ("unavailable", message.clone(), details.clone())
            }
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();
        let headers = response.headers_mut();

        match &self {
            AppError::Unauthorized { .. } => {
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            AppError::RateLimited {
                limit,
                remaining,
                reset_at,
            } => {
                let retry_after = (*reset_at - chrono::Utc::now().timestamp()).max(0);
                headers.insert("x-ratelimit-limit", HeaderValue::from(*limit));
                headers.insert("x-ratelimit-remaining", HeaderValue::from(*remaining));
                headers.insert("x-ratelimit-reset", HeaderValue::from(*reset_at));
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            }
            _ => {}
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }

        tracing::error!(error = %e, "Database error");
        AppError::unavailable("Storage unavailable", json!({}))
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        tracing::error!(error = %e, "Counter store error");
        AppError::unavailable("Counter store unavailable", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&e).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Validation failed", details)
    }
}
