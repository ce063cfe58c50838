//! In-process implementation of the short URL repository.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    rows: HashMap<i64, ShortUrl>,
    codes: HashMap<String, i64>,
}

/// Short URL repository held in process memory.
///
/// Mirrors the PostgreSQL semantics: codes are unique across every row ever
/// created, deletion only flips `is_active`, and increments are atomic.
/// Used by integration tests and for running without a database.
#[derive(Debug, Default)]
pub struct InMemoryUrlRepository {
    store: Mutex<Store>,
}

impl InMemoryUrlRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record with `id` regardless of its state.
    pub async fn get(&self, id: i64) -> Option<ShortUrl> {
        self.store.lock().await.rows.get(&id).cloned()
    }

    /// Number of records ever created.
    pub async fn len(&self) -> usize {
        self.store.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UrlRepository for InMemoryUrlRepository {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        let mut store = self.store.lock().await;

        if store.codes.contains_key(&new_url.short_code) {
            return Err(AppError::conflict(
                "Short code already exists",
                json!({ "short_code": new_url.short_code }),
            ));
        }

        store.next_id += 1;
        let url = ShortUrl {
            id: store.next_id,
            short_code: new_url.short_code,
            original_url: new_url.original_url,
            owner_id: new_url.owner_id,
            created_at: new_url.created_at,
            expires_at: new_url.expires_at,
            is_active: true,
            click_count: 0,
        };

        store.codes.insert(url.short_code.clone(), url.id);
        store.rows.insert(url.id, url.clone());

        Ok(url)
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError> {
        let store = self.store.lock().await;

        Ok(store
            .codes
            .get(short_code)
            .and_then(|id| store.rows.get(id))
            .cloned())
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<ShortUrl>, AppError> {
        let store = self.store.lock().await;

        let mut urls: Vec<ShortUrl> = store
            .rows
            .values()
            .filter(|u| u.is_active && u.owner_id.as_deref() == Some(owner_id))
            .cloned()
            .collect();

        urls.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(urls)
    }

    async fn deactivate(&self, id: i64, owner_id: &str) -> Result<u64, AppError> {
        let mut store = self.store.lock().await;

        match store.rows.get_mut(&id) {
            Some(url) if url.is_active && url.owner_id.as_deref() == Some(owner_id) => {
                url.is_active = false;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn increment_click_count(&self, id: i64) -> Result<(), AppError> {
        if let Some(url) = self.store.lock().await.rows.get_mut(&id) {
            url.click_count += 1;
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
