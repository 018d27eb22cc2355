//! API key storage.
//!
//! Only SHA-256 digests are persisted. Callers hash the presented key with
//! `gallery_core::hash_api_key` before asking the store about it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use gallery_core::{ApiKey, ApiKeyId, generate_api_key};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult, SqlResultExt};
use crate::txn::with_txn;

/// API key store sharing the gallery's pool
#[derive(Debug, Clone)]
pub struct AuthStore {
    pool: SqlitePool,
    deadline: Duration,
}

impl AuthStore {
    pub fn new(pool: SqlitePool, deadline: Duration) -> Self {
        Self { pool, deadline }
    }

    /// True only when the hash belongs to an existing, active key.
    pub async fn validate_api_key(&self, key_hash: &str) -> DbResult<bool> {
        let key_hash = key_hash.to_string();
        with_txn(&self.pool, self.deadline, |conn| {
            Box::pin(async move {
                let active: Option<bool> =
                    sqlx::query_scalar("SELECT is_active FROM api_keys WHERE key_hash = ?")
                        .bind(&key_hash)
                        .fetch_optional(&mut *conn)
                        .await
                        .during("validate api key")?;

                Ok(active.unwrap_or(false))
            })
        })
        .await
    }

    /// Stamp the key's last use with the current time.
    pub async fn update_last_used(&self, key_hash: &str) -> DbResult<()> {
        let key_hash = key_hash.to_string();
        with_txn(&self.pool, self.deadline, |conn| {
            Box::pin(async move {
                let result = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE key_hash = ?")
                    .bind(Utc::now().timestamp())
                    .bind(&key_hash)
                    .execute(&mut *conn)
                    .await
                    .during("update api key last use")?;

                if result.rows_affected() == 0 {
                    return Err(DbError::ApiKeyNotFound);
                }

                debug!("Recorded API key use");
                Ok(())
            })
        })
        .await
    }

    /// Generate and store a new key; returns the raw key, shown only once.
    pub async fn create_api_key(&self, name: &str) -> DbResult<String> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DbError::InvalidInput("API key name is empty".to_string()));
        }

        let generated = generate_api_key();
        let key_hash = generated.key_hash;

        let id = with_txn(&self.pool, self.deadline, |conn| {
            Box::pin(async move {
                let result = sqlx::query(
                    "INSERT INTO api_keys (name, key_hash, created_at, is_active)
                     VALUES (?, ?, ?, 1)",
                )
                .bind(&name)
                .bind(&key_hash)
                .bind(Utc::now().timestamp())
                .execute(&mut *conn)
                .await
                .during("create api key")?;

                Ok(ApiKeyId::new(result.last_insert_rowid()))
            })
        })
        .await?;

        info!("Created API key {}", id);
        Ok(generated.raw_key)
    }

    /// Revoke a key without deleting its record.
    pub async fn deactivate_api_key(&self, key_hash: &str) -> DbResult<()> {
        let key_hash = key_hash.to_string();
        with_txn(&self.pool, self.deadline, |conn| {
            Box::pin(async move {
                let result = sqlx::query("UPDATE api_keys SET is_active = 0 WHERE key_hash = ?")
                    .bind(&key_hash)
                    .execute(&mut *conn)
                    .await
                    .during("deactivate api key")?;

                if result.rows_affected() == 0 {
                    return Err(DbError::ApiKeyNotFound);
                }

                info!("Deactivated API key");
                Ok(())
            })
        })
        .await
    }

    /// All stored keys, oldest first.
    pub async fn list_api_keys(&self) -> DbResult<Vec<ApiKey>> {
        with_txn(&self.pool, self.deadline, |conn| {
            Box::pin(async move {
                let rows = sqlx::query_as::<_, ApiKeyRow>(
                    "SELECT id, name, key_hash, created_at, last_used_at, is_active
                     FROM api_keys
                     ORDER BY id ASC",
                )
                .fetch_all(&mut *conn)
                .await
                .during("list api keys")?;

                rows.into_iter().map(ApiKey::try_from).collect()
            })
        })
        .await
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ApiKeyRow {
    id: i64,
    name: String,
    key_hash: String,
    created_at: i64,
    last_used_at: Option<i64>,
    is_active: bool,
}

impl TryFrom<ApiKeyRow> for ApiKey {
    type Error = DbError;

    fn try_from(row: ApiKeyRow) -> DbResult<Self> {
        Ok(ApiKey {
            id: ApiKeyId::new(row.id),
            name: row.name,
            key_hash: row.key_hash,
            created_at: timestamp(row.created_at)?,
            last_used_at: row.last_used_at.map(timestamp).transpose()?,
            is_active: row.is_active,
        })
    }
}

fn timestamp(secs: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| DbError::Decode(format!("timestamp out of range: {secs}")))
}
