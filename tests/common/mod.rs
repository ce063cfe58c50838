#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use serde_json::json;
use snax_shortener::application::services::RateLimitPolicy;
use snax_shortener::domain::click_worker::{click_channel, run_click_worker};
use snax_shortener::domain::identity::IdentityResolver;
use snax_shortener::domain::repositories::CounterStore;
use snax_shortener::error::AppError;
use snax_shortener::infrastructure::counter::InMemoryCounterStore;
use snax_shortener::infrastructure::persistence::InMemoryUrlRepository;
use snax_shortener::routes::router;
use snax_shortener::state::AppState;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";
pub const BASE_URL: &str = "https://s.example.com";

/// Resolves a fixed set of tokens.
pub struct StaticIdentity {
    tokens: HashMap<String, String>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        let tokens = HashMap::from([
            (ALICE_TOKEN.to_string(), "alice".to_string()),
            (BOB_TOKEN.to_string(), "bob".to_string()),
        ]);
        Self { tokens }
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentity {
    async fn resolve(&self, credential: &str) -> Result<String, AppError> {
        self.tokens
            .get(credential)
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Unauthorized", json!({})))
    }
}

/// Identity provider that is always down.
pub struct UnavailableIdentity;

#[async_trait]
impl IdentityResolver for UnavailableIdentity {
    async fn resolve(&self, _credential: &str) -> Result<String, AppError> {
        Err(AppError::unavailable("Token store unavailable", json!({})))
    }
}

/// Counter store that is always down.
pub struct FailingCounterStore;

#[async_trait]
impl CounterStore for FailingCounterStore {
    async fn increment_with_expiry(&self, _key: &str, _ttl: Duration) -> Result<i64, AppError> {
        Err(AppError::unavailable("Counter store unavailable", json!({})))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

/// Inserts a fixed peer address, as `into_make_service_with_connect_info` would.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// Budgets large enough that ordinary tests never hit them.
pub fn generous_policy() -> RateLimitPolicy {
    RateLimitPolicy {
        authenticated_limit: 1_000,
        anonymous_limit: 500,
        window: Duration::from_secs(3600),
    }
}

/// Default budgets (10 / 5) over a long window so a test never straddles a boundary.
pub fn strict_policy() -> RateLimitPolicy {
    RateLimitPolicy {
        authenticated_limit: 10,
        anonymous_limit: 5,
        window: Duration::from_secs(3600),
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub repo: Arc<InMemoryUrlRepository>,
}

pub struct TestAppBuilder {
    policy: RateLimitPolicy,
    counter_store: Arc<dyn CounterStore>,
    identity: Arc<dyn IdentityResolver>,
    behind_proxy: bool,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            policy: generous_policy(),
            counter_store: Arc::new(InMemoryCounterStore::new()),
            identity: Arc::new(StaticIdentity::new()),
            behind_proxy: false,
        }
    }

    pub fn policy(mut self, policy: RateLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn counter_store(mut self, store: Arc<dyn CounterStore>) -> Self {
        self.counter_store = store;
        self
    }

    pub fn identity(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = identity;
        self
    }

    pub fn behind_proxy(mut self, behind_proxy: bool) -> Self {
        self.behind_proxy = behind_proxy;
        self
    }

    /// Builds the full router and spawns a click worker against the in-memory repository.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> TestApp {
        let repo = Arc::new(InMemoryUrlRepository::new());
        let (click_sender, click_rx) = click_channel(1_000);
        tokio::spawn(run_click_worker(click_rx, repo.clone(), 4));

        let state = AppState::new(
            repo.clone(),
            self.counter_store,
            self.identity,
            click_sender,
            self.policy,
            BASE_URL,
            self.behind_proxy,
        );

        let app = router(state, Duration::from_secs(5)).layer(MockConnectInfoLayer);
        let server = TestServer::new(app).unwrap();

        TestApp { server, repo }
    }
}

pub fn test_app() -> TestApp {
    TestAppBuilder::new().build()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Waits until the click worker has applied `expected` clicks to `id`.
pub async fn wait_for_clicks(repo: &InMemoryUrlRepository, id: i64, expected: i64) -> i64 {
    let mut last = 0;
    for _ in 0..100 {
        last = repo.get(id).await.map(|u| u.click_count).unwrap_or(0);
        if last >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    last
}
