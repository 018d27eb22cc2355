//! Gallery database connection pool and initialization.

use std::path::Path;

use sqlx::SqlitePool;
use tracing::info;

use crate::{
    error::DbResult,
    sqlite_runtime::{create_file_pool, run_migrations},
};

/// Gallery database pool wrapper
#[derive(Debug, Clone)]
pub struct GalleryDbPool {
    pool: SqlitePool,
}

impl GalleryDbPool {
    /// Initialize database with migrations
    ///
    /// This function:
    /// 1. Ensures the parent directory exists
    /// 2. Creates/connects to the database
    /// 3. Runs migrations
    pub async fn open(db_path: &Path, max_connections: u32) -> DbResult<Self> {
        info!("Initializing gallery database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = create_file_pool(db_path, max_connections).await?;

        run_migrations(&pool).await?;

        info!("Gallery database initialized successfully");
        Ok(Self { pool })
    }

    /// Get the inner SQLx pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Gallery database connection closed");
    }

    /// Create a GalleryDbPool from an existing, migrated SqlitePool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}
