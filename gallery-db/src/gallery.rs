//! The gallery facade.
//!
//! Every public operation runs as one transaction bounded by the gallery's
//! deadline. Repositories do the SQL; this layer owns the transaction
//! boundaries.

use std::time::Duration;

use gallery_core::{
    Character, CharacterId, CharacterPage, Config, InventoryEntry, Item, ItemId, ItemPool,
    Removal,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    auth::AuthStore,
    characters::CharacterRepository,
    db::GalleryDbPool,
    error::DbResult,
    inventory::InventoryRepository,
    items::ItemRepository,
    txn::with_txn,
};

/// Persistence facade for characters, the item catalog and inventories
#[derive(Debug, Clone)]
pub struct Gallery {
    db: GalleryDbPool,
    auth: AuthStore,
    deadline: Duration,
}

impl Gallery {
    pub fn new(db: GalleryDbPool, deadline: Duration) -> Self {
        let auth = AuthStore::new(db.pool().clone(), deadline);
        Self { db, auth, deadline }
    }

    /// Open the configured database, apply migrations and build the facade.
    pub async fn connect(config: &Config) -> DbResult<Self> {
        let db = GalleryDbPool::open(&config.database_path(), config.max_connections).await?;
        Ok(Self::new(db, config.operation_timeout))
    }

    pub fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    pub fn auth_store(&self) -> &AuthStore {
        &self.auth
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    /// Persist a new character; its id is filled in once the write commits.
    pub async fn create(&self, character: &mut Character) -> DbResult<()> {
        let snapshot = character.clone();
        let id = with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move { CharacterRepository::insert(conn, &snapshot).await })
        })
        .await?;

        character.id = id;
        Ok(())
    }

    pub async fn get(&self, id: CharacterId) -> DbResult<Character> {
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move { CharacterRepository::get(conn, id).await })
        })
        .await
    }

    /// One page of characters ordered by id, with the total count.
    pub async fn get_all(&self, page: u32, limit: u32) -> DbResult<CharacterPage> {
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move {
                let characters = CharacterRepository::list(&mut *conn, page, limit).await?;
                let total = CharacterRepository::count(&mut *conn).await?;
                Ok(CharacterPage { characters, total })
            })
        })
        .await
    }

    pub async fn edit(&self, character: &Character) -> DbResult<()> {
        let character = character.clone();
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move { CharacterRepository::update(conn, &character).await })
        })
        .await
    }

    pub async fn remove(&self, id: CharacterId) -> DbResult<()> {
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move { CharacterRepository::delete(conn, id).await })
        })
        .await
    }

    /// Add an item to the catalog; its id is filled in once the write commits.
    pub async fn create_item(&self, item: &mut Item) -> DbResult<()> {
        let snapshot = item.clone();
        let id = with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move { ItemRepository::insert(conn, &snapshot).await })
        })
        .await?;

        item.id = id;
        Ok(())
    }

    /// Upsert a fixed catalog keyed by explicit ids.
    ///
    /// Safe to run on every startup. Either every item is written or none is.
    pub async fn seed_items(&self, items: &[Item]) -> DbResult<()> {
        let items = items.to_vec();
        let count = items.len();

        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move {
                for item in &items {
                    ItemRepository::upsert_with_id(&mut *conn, item).await?;
                }
                ItemRepository::advance_sequence(&mut *conn).await
            })
        })
        .await?;

        info!("Seeded {} catalog items", count);
        Ok(())
    }

    pub async fn seed_pool(&self, pool: &ItemPool) -> DbResult<()> {
        self.seed_items(&pool.items).await
    }

    pub async fn display_pool_items(&self) -> DbResult<Vec<Item>> {
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move { ItemRepository::list_all(conn).await })
        })
        .await
    }

    pub async fn display_item(&self, id: ItemId) -> DbResult<Item> {
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move { ItemRepository::get(conn, id).await })
        })
        .await
    }

    pub async fn add_item_to_character(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        quantity: u8,
    ) -> DbResult<InventoryEntry> {
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move {
                InventoryRepository::add(conn, character_id, item_id, quantity).await
            })
        })
        .await
    }

    pub async fn remove_item_from_character(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        quantity: u8,
    ) -> DbResult<Removal> {
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move {
                InventoryRepository::remove(conn, character_id, item_id, quantity).await
            })
        })
        .await
    }

    pub async fn get_character_inventory(
        &self,
        character_id: CharacterId,
    ) -> DbResult<Vec<InventoryEntry>> {
        with_txn(self.pool(), self.deadline, |conn| {
            Box::pin(async move {
                InventoryRepository::list_for_character(conn, character_id).await
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DbError, ErrorKind};
    use crate::test_helpers::create_test_gallery;
    use gallery_core::ItemType;

    #[tokio::test]
    async fn test_seed_pool_from_json() {
        let gallery = create_test_gallery().await.unwrap();
        let pool = ItemPool::from_json(
            r#"[
                {"id": 1, "name": "Healing Potion", "type": "potion",
                 "description": "Restores a little health", "equippable": false,
                 "rarity": 1, "heal_amount": 10},
                {"id": 2, "name": "Iron Shield", "type": "shield",
                 "description": "Heavy but dependable", "equippable": true,
                 "rarity": 2, "defense": 3}
            ]"#,
        )
        .unwrap();

        gallery.seed_pool(&pool).await.unwrap();

        let items = gallery.display_pool_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_type, ItemType::Potion);
        assert_eq!(items[0].heal_amount, Some(10));
        assert_eq!(items[1].defense, Some(3));
    }

    #[tokio::test]
    async fn test_auth_store_shares_the_pool() {
        let gallery = create_test_gallery().await.unwrap();
        gallery.auth_store().create_api_key("ops").await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys")
            .fetch_one(gallery.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_closed_gallery_fails_to_begin() {
        let gallery = create_test_gallery().await.unwrap();
        gallery.close().await;

        let err = gallery.get(CharacterId::new(1)).await.unwrap_err();
        assert!(matches!(err, DbError::Begin(_)));
        assert_eq!(err.kind(), ErrorKind::Transaction);
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_connect_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_url: format!("sqlite:{}", dir.path().join("nested/gallery.sqlite3").display()),
            max_connections: 2,
            operation_timeout: Duration::from_secs(5),
            item_pool_path: dir.path().join("item_pool.json"),
        };

        let gallery = Gallery::connect(&config).await.unwrap();
        assert!(gallery.display_pool_items().await.unwrap().is_empty());
        gallery.close().await;

        assert!(dir.path().join("nested/gallery.sqlite3").exists());
    }
}
