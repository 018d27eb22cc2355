//! gallery-db: transactional SQLite persistence for the character gallery.
//!
//! This crate provides database operations for:
//! - Characters (base record, stats and customization as one aggregate)
//! - The item catalog, including idempotent seeding from a fixed pool
//! - Character inventories with merge-on-add and decrement-or-delete removal
//! - API keys stored as SHA-256 digests
//!
//! Every operation on [`Gallery`] and [`AuthStore`] runs in its own
//! transaction with a deadline.

pub mod auth;
pub mod characters;
pub mod db;
pub mod error;
pub mod gallery;
pub mod inventory;
pub mod items;
mod sqlite_runtime;
pub mod txn;

// Re-export commonly used types
pub use auth::AuthStore;
pub use characters::{CharacterRepository, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, effective_page_size};
pub use db::GalleryDbPool;
pub use error::{DbError, DbResult, ErrorKind};
pub use gallery::Gallery;
pub use inventory::InventoryRepository;
pub use items::ItemRepository;
pub use txn::with_txn;

// Re-export test helpers when running tests or when test-helpers feature is enabled
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
