//! Handlers for owner-scoped URL management.
//!
//! Every route here sits behind [`crate::api::middleware::auth::require_auth`].

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde_json::json;

use crate::api::dto::shorten::ShortenRequest;
use crate::api::dto::url::{UrlListResponse, UrlResponse};
use crate::api::handlers::shorten::create;
use crate::api::middleware::auth::CurrentSubject;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL owned by the caller.
///
/// # Endpoint
///
/// `POST /api/urls`
///
/// Same body and response as `POST /api/shorten`.
pub async fn create_url_handler(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    create(&state, Some(subject), payload).await
}

/// Lists the caller's active short URLs, newest first.
///
/// # Endpoint
///
/// `GET /api/urls`
///
/// Expired links are included so they can still be deleted.
pub async fn list_urls_handler(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
) -> Result<Json<UrlListResponse>, AppError> {
    let urls = state.url_service.list_user_urls(&subject).await?;

    let items: Vec<UrlResponse> = urls
        .into_iter()
        .map(|u| UrlResponse::from_entity(u, &state.base_url))
        .collect();

    Ok(Json(UrlListResponse {
        total: items.len(),
        items,
    }))
}

/// Soft-deletes one of the caller's short URLs.
///
/// # Endpoint
///
/// `DELETE /api/urls/{id}`
///
/// # Response
///
/// `204 No Content`. The short code answers 404 from then on and is never
/// reissued.
///
/// # Errors
///
/// 400 Bad Request when `id` is not an integer. 404 Not Found when the
/// record does not exist, is owned by someone else, or was already deleted.
pub async fn delete_url_handler(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path.map_err(|e| {
        AppError::bad_request("Invalid URL id", json!({ "reason": e.body_text() }))
    })?;

    state.url_service.delete_url(id, &subject).await?;

    Ok(StatusCode::NO_CONTENT)
}
