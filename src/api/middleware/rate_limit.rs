//! Fixed-window rate limiting middleware.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::application::services::Admission;
use crate::domain::client_identity::ClientIdentity;
use crate::domain::identity::Subject;
use crate::{error::AppError, state::AppState};

/// Counts the request against its client's window and rejects it when over budget.
///
/// # Key Extraction
///
/// The [`Subject`] attached by [`super::auth::identify`] wins. Anonymous
/// callers are keyed by address: the peer socket address, or the
/// forwarded headers when [`AppState::behind_proxy`] is set.
///
/// # Response Headers
///
/// Admitted responses carry `X-RateLimit-Limit`, `X-RateLimit-Remaining`
/// and `X-RateLimit-Reset` (unix seconds).
///
/// # Errors
///
/// - `429 Too Many Requests` with the same headers plus `Retry-After`
/// - `503 Service Unavailable` if the counter store fails; requests are
///   never admitted uncounted
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = {
        let subject = req.extensions().get::<Subject>().map(|s| s.0.as_str());
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        ClientIdentity::derive(subject, req.headers(), peer, st.behind_proxy)
    };

    let admission = st.rate_limiter.check(&identity).await?;

    let mut response = next.run(req).await;
    apply_headers(response.headers_mut(), &admission);

    Ok(response)
}

fn apply_headers(headers: &mut HeaderMap, admission: &Admission) {
    headers.insert("x-ratelimit-limit", HeaderValue::from(admission.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(admission.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(admission.reset_at));
}
