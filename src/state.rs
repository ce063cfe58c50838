//! Shared application state injected into handlers and middleware.

use std::sync::Arc;

use crate::application::services::{RateLimitPolicy, RateLimiter, UrlService};
use crate::domain::click_worker::ClickSender;
use crate::domain::identity::IdentityResolver;
use crate::domain::repositories::{CounterStore, UrlRepository};

/// Cheaply cloneable handle to every service a request may need.
///
/// Collaborators are held behind trait objects so the same router serves
/// PostgreSQL/Redis in production and in-memory stores in tests.
#[derive(Clone)]
pub struct AppState {
    pub url_service: Arc<UrlService<dyn UrlRepository>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub identity: Arc<dyn IdentityResolver>,
    pub counter_store: Arc<dyn CounterStore>,
    pub click_sender: ClickSender,
    pub base_url: Arc<str>,
    /// Trust `X-Forwarded-For` / `X-Real-IP` when deriving client addresses.
    pub behind_proxy: bool,
}

impl AppState {
    /// Wires the services around the given collaborators.
    pub fn new(
        url_repository: Arc<dyn UrlRepository>,
        counter_store: Arc<dyn CounterStore>,
        identity: Arc<dyn IdentityResolver>,
        click_sender: ClickSender,
        policy: RateLimitPolicy,
        base_url: &str,
        behind_proxy: bool,
    ) -> Self {
        Self {
            url_service: Arc::new(UrlService::new(url_repository, click_sender.clone())),
            rate_limiter: Arc::new(RateLimiter::new(counter_store.clone(), policy)),
            identity,
            counter_store,
            click_sender,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            behind_proxy,
        }
    }
}
