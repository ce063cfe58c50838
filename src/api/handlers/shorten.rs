//! Handler for the public shortening endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::ShortenRequest;
use crate::api::dto::url::UrlResponse;
use crate::api::middleware::auth::MaybeSubject;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL. Authentication is optional.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// When the caller presents a valid bearer token the record is owned by its
/// subject and shows up in `GET /api/urls`; otherwise it is anonymous and
/// cannot be deleted.
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "expires_at": "2030-01-01T00:00:00Z"
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "id": 1,
///   "short_code": "aB3xY9",
///   "short_url": "https://s.example.com/aB3xY9",
///   "original_url": "https://example.com/some/long/path",
///   "created_at": "2025-01-01T00:00:00Z",
///   "expires_at": "2030-01-01T00:00:00Z",
///   "is_active": true,
///   "click_count": 0
/// }
/// ```
///
/// # Errors
///
/// - 400 Bad Request on malformed JSON or an invalid URL
/// - 503 Service Unavailable if no unique code could be allocated
pub async fn shorten_handler(
    State(state): State<AppState>,
    MaybeSubject(owner): MaybeSubject,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    create(&state, owner, payload).await
}

/// Shared body of the public and owner creation endpoints.
pub(crate) async fn create(
    state: &AppState,
    owner: Option<String>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    let Json(payload) = payload.map_err(|e| {
        AppError::bad_request("Invalid request body", json!({ "reason": e.body_text() }))
    })?;

    payload.validate()?;

    let url = state
        .url_service
        .create_short_url(&payload.url, owner, payload.expires_at)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UrlResponse::from_entity(url, &state.base_url)),
    ))
}
