//! Transaction runner shared by every store operation.

use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{SqliteConnection, SqlitePool};
use tokio::time::{Instant, timeout_at};
use tracing::warn;

use crate::error::{DbError, DbResult};

/// Run `f` inside one transaction bounded by `deadline`.
///
/// 1) Acquire a pooled connection and `BEGIN` (counts against the deadline)
/// 2) Run the body
/// 3) Commit on `Ok` (also within the deadline), roll back on `Err` or when
///    the deadline expires
///
/// The connection returns to the pool when this function returns, whichever
/// way it ends.
pub async fn with_txn<R, F>(pool: &SqlitePool, deadline: Duration, f: F) -> DbResult<R>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, DbResult<R>>,
{
    let expires_at = Instant::now() + deadline;

    let mut tx = match timeout_at(expires_at, pool.begin()).await {
        Ok(Ok(tx)) => tx,
        Ok(Err(err)) => return Err(DbError::Begin(err)),
        Err(_) => {
            warn!("Deadline of {:?} expired before transaction began", deadline);
            return Err(DbError::Timeout(deadline));
        }
    };

    let outcome = timeout_at(expires_at, f(&mut *tx)).await;

    match outcome {
        Ok(Ok(value)) => match timeout_at(expires_at, tx.commit()).await {
            Ok(Ok(())) => Ok(value),
            Ok(Err(err)) => {
                warn!("Commit failed, transaction rolled back: {}", err);
                Err(DbError::Commit(err))
            }
            Err(_) => {
                // Dropping the unfinished commit rolls the transaction back
                warn!("Deadline of {:?} expired during commit", deadline);
                Err(DbError::Timeout(deadline))
            }
        },
        Ok(Err(err)) => {
            warn!("Rolling back after error: {}", err);
            // Best-effort rollback; preserve original error
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback after '{}' failed: {}", err, rollback_err);
            }
            Err(err)
        }
        Err(_) => {
            warn!("Deadline of {:?} expired, rolling back", deadline);
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback after deadline failed: {}", rollback_err);
            }
            Err(DbError::Timeout(deadline))
        }
    }
}
