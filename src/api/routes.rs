//! API route configuration.
//!
//! Mounted under `/api`. Identity resolution and rate limiting are applied
//! by [`crate::routes::app_router`].

use crate::api::handlers::{
    create_url_handler, delete_url_handler, list_urls_handler, shorten_handler,
};
use crate::api::middleware::auth;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

/// Routes open to anonymous callers.
///
/// - `POST /shorten` - Create a short URL (owned if a valid token is presented)
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/shorten", post(shorten_handler))
}

/// Owner-scoped routes, rejected with 401 unless a subject was resolved.
///
/// - `POST   /urls`      - Create a short URL owned by the caller
/// - `GET    /urls`      - List the caller's active URLs
/// - `DELETE /urls/{id}` - Soft-delete one of the caller's URLs
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", get(list_urls_handler).post(create_url_handler))
        .route("/urls/{id}", delete(delete_url_handler))
        .route_layer(middleware::from_fn(auth::require_auth))
}
