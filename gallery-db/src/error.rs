//! Database error types.

use std::time::Duration;

use gallery_core::{CharacterId, ItemId};
use sqlx::error::ErrorKind as SqlErrorKind;

/// Database operation errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Could not open a transaction
    #[error("Failed to begin transaction: {0}")]
    Begin(#[source] sqlx::Error),

    /// The transaction body succeeded but the commit did not
    #[error("Failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),

    /// A statement failed for a reason other than a constraint or connectivity
    #[error("{op} failed: {source}")]
    Statement {
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Character {character_id} does not own item {item_id}")]
    InventoryEntryNotFound {
        character_id: CharacterId,
        item_id: ItemId,
    },

    #[error("API key not found")]
    ApiKeyNotFound,

    /// Unique, foreign key, check or not-null violation
    #[error("Conflict during {op}: {detail}")]
    Conflict { op: &'static str, detail: String },

    /// Pool or connection level failure
    #[error("Database unavailable: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Operation exceeded its deadline of {0:?}")]
    Timeout(Duration),

    #[error("Adding {requested} of item {item_id} to a stack of {current} exceeds the maximum of {max}")]
    QuantityOverflow {
        item_id: ItemId,
        current: u8,
        requested: u8,
        max: u8,
    },

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stored value could not be mapped back to a domain type
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification for callers turning errors into responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transaction,
    NotFound,
    Conflict,
    Connectivity,
    Timeout,
    InvalidInput,
    Internal,
}

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Begin(_) | DbError::Commit(_) => ErrorKind::Transaction,
            DbError::CharacterNotFound(_)
            | DbError::ItemNotFound(_)
            | DbError::InventoryEntryNotFound { .. }
            | DbError::ApiKeyNotFound => ErrorKind::NotFound,
            DbError::Conflict { .. } | DbError::QuantityOverflow { .. } => ErrorKind::Conflict,
            DbError::Connection(_) => ErrorKind::Connectivity,
            DbError::Timeout(_) => ErrorKind::Timeout,
            DbError::InvalidQuantity | DbError::InvalidInput(_) => ErrorKind::InvalidInput,
            DbError::Statement { .. }
            | DbError::Decode(_)
            | DbError::Migration(_)
            | DbError::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Classify a raw sqlx error raised while running `op`.
    pub fn from_sqlx(op: &'static str, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                SqlErrorKind::UniqueViolation
                | SqlErrorKind::ForeignKeyViolation
                | SqlErrorKind::NotNullViolation
                | SqlErrorKind::CheckViolation => DbError::Conflict {
                    op,
                    detail: db_err.message().to_string(),
                },
                _ => DbError::Statement { op, source: err },
            },
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => DbError::Connection(err),
            _ => DbError::Statement { op, source: err },
        }
    }
}

/// Tag sqlx results with the operation that produced them.
pub(crate) trait SqlResultExt<T> {
    fn during(self, op: &'static str) -> DbResult<T>;
}

impl<T> SqlResultExt<T> for Result<T, sqlx::Error> {
    fn during(self, op: &'static str) -> DbResult<T> {
        self.map_err(|err| DbError::from_sqlx(op, err))
    }
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_connectivity() {
        let err = DbError::from_sqlx("load items", sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Connectivity);
    }

    #[test]
    fn test_other_errors_keep_operation_name() {
        let err = DbError::from_sqlx("load items", sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().starts_with("load items failed"));
    }

    #[test]
    fn test_not_found_kinds() {
        assert!(DbError::CharacterNotFound(CharacterId::new(3)).is_not_found());
        assert!(
            DbError::InventoryEntryNotFound {
                character_id: CharacterId::new(1),
                item_id: ItemId::new(2),
            }
            .is_not_found()
        );
        assert!(!DbError::InvalidQuantity.is_not_found());
    }
}
