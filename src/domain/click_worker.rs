//! Bounded background worker that applies click increments.
//!
//! Redirect handlers push [`ClickEvent`]s with [`ClickSender::send`], which
//! never waits: a full queue drops the event and logs it. The worker drains
//! the queue with at most `concurrency` increments in flight and retries each
//! failed increment a bounded number of times.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::UrlRepository;

/// Number of retries after the first failed increment.
const MAX_RETRIES: usize = 3;

/// Producer half of the click queue.
#[derive(Clone, Debug)]
pub struct ClickSender {
    tx: mpsc::Sender<ClickEvent>,
}

/// Creates a bounded click queue.
pub fn click_channel(capacity: usize) -> (ClickSender, mpsc::Receiver<ClickEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ClickSender { tx }, rx)
}

impl ClickSender {
    /// Enqueues a click without waiting.
    ///
    /// Returns `false` when the event was dropped (queue full or closed).
    pub fn send(&self, event: ClickEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(ev)) => {
                metrics::counter!("clicks_dropped_total", "reason" => "full").increment(1);
                warn!(url_id = ev.url_id, "Click queue full, dropping click");
                false
            }
            Err(mpsc::error::TrySendError::Closed(ev)) => {
                metrics::counter!("clicks_dropped_total", "reason" => "closed").increment(1);
                error!(url_id = ev.url_id, "Click queue closed, dropping click");
                false
            }
        }
    }

    /// Returns true if the worker has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Remaining queue capacity.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Drains the click queue until every sender is dropped.
///
/// Each event becomes one `increment_click_count` call on a detached task.
/// A semaphore caps in-flight increments at `concurrency`; when the cap is
/// reached the worker stops pulling from the queue, so backpressure lands on
/// [`ClickSender::send`] as dropped events rather than on redirects.
///
/// Returns once the queue is closed and all in-flight increments settled.
pub async fn run_click_worker<R>(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<R>,
    concurrency: usize,
) where
    R: UrlRepository + ?Sized + 'static,
{
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let repository = repository.clone();

        tokio::spawn(async move {
            let _permit = permit;
            apply_click(repository.as_ref(), event).await;
        });
    }

    // Wait for in-flight increments before returning.
    let _ = permits.acquire_many(concurrency as u32).await;
    info!("Click worker stopped");
}

async fn apply_click<R>(repository: &R, event: ClickEvent)
where
    R: UrlRepository + ?Sized,
{
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(std::time::Duration::from_secs(1))
        .map(jitter)
        .take(MAX_RETRIES);

    let result = Retry::start(strategy, || repository.increment_click_count(event.url_id)).await;

    match result {
        Ok(()) => {
            debug!(url_id = event.url_id, "Click recorded");
        }
        Err(e) => {
            metrics::counter!("clicks_failed_total").increment(1);
            error!(
                url_id = event.url_id,
                clicked_at = %event.clicked_at,
                error = %e,
                "Failed to record click, giving up"
            );
        }
    }
}
