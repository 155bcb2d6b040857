use async_trait::async_trait;
use chrono::Duration;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::auth::errors::TokenCacheError;
use crate::domain::auth::ports::TokenCache;

/// PostgreSQL implementation of TokenCache.
///
/// Entries live in `cache_entries` with an absolute `expires_at`. Writes are
/// upserts so re-revoking a token only extends its marker.
pub struct PostgresTokenCache {
    pool: PgPool,
}

impl PostgresTokenCache {
    /// Create a new PostgreSQL token cache.
    ///
    /// # Arguments
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend_error(e: sqlx::Error) -> TokenCacheError {
    TokenCacheError::Backend(e.to_string())
}

#[async_trait]
impl TokenCache for PostgresTokenCache {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), TokenCacheError> {
        let expires_at = Utc::now() + ttl;

        sqlx::query(
            r#"
            INSERT INTO cache_entries (cache_key, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (cache_key)
            DO UPDATE SET
                data = EXCLUDED.data,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(&value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        tracing::debug!(key = %key, expires_at = %expires_at, "Cache entry stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, TokenCacheError> {
        let row: Option<(Value,)> = sqlx::query_as(
            r#"
            SELECT data
            FROM cache_entries
            WHERE cache_key = $1 AND expires_at > NOW()
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(row.map(|(data,)| data))
    }

    async fn invalidate(&self, key: &str) -> Result<(), TokenCacheError> {
        sqlx::query("DELETE FROM cache_entries WHERE cache_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, TokenCacheError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(result.rows_affected())
    }
}
