//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, counter store setup, click worker spawning,
//! and the Axum server lifecycle.

use crate::application::services::AuthService;
use crate::config::{Config, mask_connection_string};
use crate::domain::click_worker::{click_channel, run_click_worker};
use crate::domain::identity::IdentityResolver;
use crate::domain::repositories::{CounterStore, UrlRepository};
use crate::infrastructure::counter::{InMemoryCounterStore, RedisCounterStore};
use crate::infrastructure::persistence::{PgTokenRepository, PgUrlRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// How long shutdown waits for queued clicks to be applied.
const CLICK_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis counter store (in-memory when Redis is not configured)
/// - Background click worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let pool = Arc::new(pool);
    let counter_store = connect_counter_store(
        config.redis_url.as_deref(),
        Duration::from_secs(config.redis_connect_timeout_secs),
    )
    .await?;

    let url_repository: Arc<dyn UrlRepository> = Arc::new(PgUrlRepository::new(pool.clone()));
    let identity: Arc<dyn IdentityResolver> = Arc::new(AuthService::new(
        Arc::new(PgTokenRepository::new(pool.clone())),
        config.token_signing_secret.clone(),
    ));

    let (click_sender, click_rx) = click_channel(config.click_queue_capacity);
    let worker = tokio::spawn(run_click_worker(
        click_rx,
        url_repository.clone(),
        config.click_worker_concurrency,
    ));
    tracing::info!(
        concurrency = config.click_worker_concurrency,
        "Click worker started"
    );

    let state = AppState::new(
        url_repository,
        counter_store,
        identity,
        click_sender,
        config.rate_limit_policy(),
        &config.base_url,
        config.behind_proxy,
    );

    let app = app_router(state, config.request_timeout());

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router (and every click sender) is gone; let the worker drain.
    match tokio::time::timeout(CLICK_DRAIN_TIMEOUT, worker).await {
        Ok(_) => tracing::info!("Shutdown complete"),
        Err(_) => tracing::warn!("Click worker did not drain in time, pending clicks lost"),
    }

    Ok(())
}

/// Picks the counter store for the rate limiter.
///
/// Without a Redis URL the limiter counts in process memory, which only holds
/// for a single instance. When a URL is configured, Redis is the shared
/// budget across instances and must be reachable: falling back to local
/// counters would multiply the effective limit by the instance count.
///
/// # Errors
///
/// Returns an error if `redis_url` is set and Redis cannot be reached within
/// `connect_timeout`.
pub async fn connect_counter_store(
    redis_url: Option<&str>,
    connect_timeout: Duration,
) -> Result<Arc<dyn CounterStore>> {
    let Some(redis_url) = redis_url else {
        tracing::warn!("REDIS_URL not set, rate limits are per instance (in-memory counters)");
        return Ok(Arc::new(InMemoryCounterStore::new()));
    };

    let store = RedisCounterStore::connect(redis_url, connect_timeout)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to Redis counter store at {}",
                mask_connection_string(redis_url)
            )
        })?;
    tracing::info!("Counter store enabled (Redis)");

    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
