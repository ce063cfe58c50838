//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`  - Health check: DB, counter store, click queue (not rate limited)
//! - `GET  /{code}`  - Short link redirect (rate limited)
//! - `/api/*`        - REST API (rate limited; `/api/urls` requires a bearer token)
//!
//! # Middleware (outermost first)
//!
//! - **Tracing** - Structured request/response logging
//! - **Timeout** - Bounds every request to `REQUEST_TIMEOUT_SECS`
//! - **Identity** - Optional bearer token to subject resolution
//! - **Rate limiting** - Fixed window per subject or client address
//! - **Authentication** - Owner routes only
//! - **Path normalization** - Trailing slash handling

use std::time::Duration;

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::timeout::TimeoutLayer;

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `request_timeout` - upper bound per request; elapsed requests get 503
pub fn app_router(state: AppState, request_timeout: Duration) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state, request_timeout))
}

/// Routes and middleware without path normalization.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let api_router = api::routes::public_routes().merge(api::routes::owner_routes());

    let limited = Router::new()
        .route("/{code}", get(redirect_handler))
        .nest("/api", api_router)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::layer,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(limited)
        .layer(middleware::from_fn_with_state(state.clone(), auth::identify))
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::SERVICE_UNAVAILABLE,
            request_timeout,
        ))
        .layer(tracing::layer())
}
