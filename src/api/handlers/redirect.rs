//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code (read-only; expiry evaluated against the clock)
/// 2. Queue a click for the background worker without waiting
/// 3. Return 307 Temporary Redirect
///
/// # Errors
///
/// - 404 Not Found if the code was never issued or has been deleted
/// - 410 Gone if the link has expired
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let url = state.url_service.get_url(&code).await?;

    state.url_service.record_click(url.id);

    Ok(Redirect::temporary(&url.original_url))
}
