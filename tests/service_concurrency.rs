use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use snax_shortener::application::services::{RateLimitPolicy, RateLimiter};
use snax_shortener::domain::click_worker::{click_channel, run_click_worker};
use snax_shortener::domain::client_identity::ClientIdentity;
use snax_shortener::infrastructure::counter::InMemoryCounterStore;
use snax_shortener::infrastructure::persistence::InMemoryUrlRepository;
use snax_shortener::prelude::UrlService;

#[tokio::test]
async fn test_concurrent_creations_get_unique_codes() {
    let repo = Arc::new(InMemoryUrlRepository::new());
    let (clicks, _rx) = click_channel(100);
    let service = Arc::new(UrlService::new(repo.clone(), clicks));

    let handles: Vec<_> = (0..200)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_short_url(&format!("https://example.com/{i}"), None, None)
                    .await
            })
        })
        .collect();

    let mut codes = HashSet::new();
    for handle in handles {
        let url = handle.await.unwrap().unwrap();
        assert!(codes.insert(url.short_code));
    }

    assert_eq!(codes.len(), 200);
    assert_eq!(repo.len().await, 200);
}

#[tokio::test]
async fn test_concurrent_clicks_are_not_lost() {
    let repo = Arc::new(InMemoryUrlRepository::new());
    let (clicks, rx) = click_channel(1_000);
    let worker = tokio::spawn(run_click_worker(rx, repo.clone(), 8));

    let service = Arc::new(UrlService::new(repo.clone(), clicks));
    let url = service
        .create_short_url("https://example.com", None, None)
        .await
        .unwrap();

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let service = service.clone();
            let code = url.short_code.clone();
            tokio::spawn(async move {
                let resolved = service.get_url(&code).await.unwrap();
                service.record_click(resolved.id);
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    // Dropping the last sender lets the worker drain and stop.
    drop(service);
    tokio::time::timeout(Duration::from_secs(5), worker)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(repo.get(url.id).await.unwrap().click_count, 100);
}

#[tokio::test]
async fn test_concurrent_admissions_never_exceed_limit() {
    let limiter = Arc::new(RateLimiter::new(
        Arc::new(InMemoryCounterStore::new()),
        RateLimitPolicy {
            authenticated_limit: 10,
            anonymous_limit: 5,
            window: Duration::from_secs(3600),
        },
    ));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                let identity = ClientIdentity::Address("192.0.2.7".to_string());
                limiter.check(&identity).await.is_ok()
            })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 5);
}
