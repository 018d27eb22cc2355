//! Test helpers for the gallery database.

use std::time::Duration;

use crate::{
    db::GalleryDbPool,
    error::DbResult,
    gallery::Gallery,
    sqlite_runtime::{create_in_memory_pool, run_migrations},
};

/// Deadline used by test galleries
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Create an in-memory gallery database for testing
pub async fn create_test_pool() -> DbResult<GalleryDbPool> {
    let pool = create_in_memory_pool(1).await?;

    run_migrations(&pool).await?;

    Ok(GalleryDbPool::from_pool(pool))
}

/// Create a gallery facade over a fresh in-memory database
pub async fn create_test_gallery() -> DbResult<Gallery> {
    let db = create_test_pool().await?;
    Ok(Gallery::new(db, TEST_DEADLINE))
}
