//! PostgreSQL implementation of the short URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewShortUrl, ShortUrl};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on_code;

#[derive(sqlx::FromRow)]
struct ShortUrlRow {
    id: i64,
    short_code: String,
    original_url: String,
    owner_id: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    click_count: i64,
}

impl From<ShortUrlRow> for ShortUrl {
    fn from(r: ShortUrlRow) -> Self {
        ShortUrl {
            id: r.id,
            short_code: r.short_code,
            original_url: r.original_url,
            owner_id: r.owner_id,
            created_at: r.created_at,
            expires_at: r.expires_at,
            is_active: r.is_active,
            click_count: r.click_count,
        }
    }
}

const COLUMNS: &str =
    "id, short_code, original_url, owner_id, created_at, expires_at, is_active, click_count";

/// PostgreSQL repository for short URL records.
///
/// Short code uniqueness is enforced by the `short_urls_short_code_key`
/// constraint; inserts never overwrite an existing row.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        let sql = format!(
            "INSERT INTO short_urls (short_code, original_url, owner_id, created_at, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );

        let row = sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(&new_url.short_code)
            .bind(&new_url.original_url)
            .bind(&new_url.owner_id)
            .bind(new_url.created_at)
            .bind(new_url.expires_at)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation_on_code(&e) {
                    AppError::conflict(
                        "Short code already exists",
                        json!({ "short_code": new_url.short_code }),
                    )
                } else {
                    AppError::from(e)
                }
            })?;

        Ok(row.into())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<ShortUrl>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM short_urls WHERE short_code = $1");

        let row = sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<ShortUrl>, AppError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM short_urls
             WHERE owner_id = $1 AND is_active
             ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, ShortUrlRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn deactivate(&self, id: i64, owner_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET is_active = FALSE
            WHERE id = $1 AND owner_id = $2 AND is_active
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn increment_click_count(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE short_urls SET click_count = click_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
