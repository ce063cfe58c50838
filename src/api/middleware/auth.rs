//! Bearer token identity middleware and subject extractors.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;
use tracing::debug;

use crate::domain::identity::Subject;
use crate::{error::AppError, state::AppState};

/// Resolves an optional bearer token into a [`Subject`] request extension.
///
/// Runs on every route, before rate limiting, so the limiter can key
/// authenticated callers by subject id.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Outcomes
///
/// - No header (or not a bearer header): request continues as anonymous
/// - Valid token: [`Subject`] is inserted and the request continues
/// - Unknown or revoked token: request continues as anonymous; owner
///   routes reject it later in [`require_auth`]
///
/// # Errors
///
/// Returns `503 Service Unavailable` if the token store cannot be reached.
pub async fn identify(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    if let Ok(AuthBearer(token)) = AuthBearer::from_request_parts(&mut parts, &()).await {
        match st.identity.resolve(&token).await {
            Ok(subject) => {
                parts.extensions.insert(Subject(subject));
            }
            Err(AppError::Unauthorized { .. }) => {
                debug!("Bearer token rejected, continuing as anonymous");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Rejects requests that [`identify`] did not attach a [`Subject`] to.
///
/// # Errors
///
/// Returns `401 Unauthorized` with `WWW-Authenticate: Bearer` (RFC 6750).
///
/// # Example
///
/// ```rust,ignore
/// let owner = Router::new()
///     .route("/urls", get(list_urls_handler))
///     .route_layer(middleware::from_fn(auth::require_auth));
/// ```
pub async fn require_auth(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<Subject>().is_none() {
        return Err(AppError::unauthorized(
            "Unauthorized",
            json!({"reason": "Authorization header is missing or invalid"}),
        ));
    }

    Ok(next.run(req).await)
}

/// Subject of an authenticated request.
///
/// Rejects with `401` when no subject was resolved.
#[derive(Debug, Clone)]
pub struct CurrentSubject(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSubject {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Subject>()
            .map(|s| CurrentSubject(s.0.clone()))
            .ok_or_else(|| {
                AppError::unauthorized("Unauthorized", json!({"reason": "Authentication required"}))
            })
    }
}

/// Subject of the request if one was resolved, `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct MaybeSubject(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeSubject {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSubject(
            parts.extensions.get::<Subject>().map(|s| s.0.clone()),
        ))
    }
}
