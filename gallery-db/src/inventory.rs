//! Character inventories.
//!
//! A stack is one `(character_id, item_id)` row. Adding merges into an
//! existing stack with a single upsert; removing either decrements the stack
//! or deletes it. Both are conditional writes so concurrent callers never lose
//! an update.

use gallery_core::{CharacterId, InventoryEntry, ItemId, MAX_ITEM_QUANTITY, Removal};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{DbError, DbResult, SqlResultExt};
use crate::items::ItemRow;

/// Inventory repository for database operations
pub struct InventoryRepository;

impl InventoryRepository {
    /// Add `quantity` units of an item, merging into an existing stack.
    ///
    /// Returns the resulting entry. A merge that would exceed
    /// `MAX_ITEM_QUANTITY` changes nothing and fails with `QuantityOverflow`.
    pub async fn add(
        conn: &mut SqliteConnection,
        character_id: CharacterId,
        item_id: ItemId,
        quantity: u8,
    ) -> DbResult<InventoryEntry> {
        if quantity == 0 {
            return Err(DbError::InvalidQuantity);
        }

        let result = sqlx::query(
            "INSERT INTO inventory (character_id, item_id, quantity)
             VALUES (?, ?, ?)
             ON CONFLICT(character_id, item_id) DO UPDATE
             SET quantity = inventory.quantity + excluded.quantity
             WHERE inventory.quantity + excluded.quantity <= ?",
        )
        .bind(character_id.get())
        .bind(item_id.get())
        .bind(quantity)
        .bind(MAX_ITEM_QUANTITY)
        .execute(&mut *conn)
        .await
        .during("add inventory item")?;

        if result.rows_affected() == 0 {
            let current = Self::quantity(conn, character_id, item_id)
                .await?
                .unwrap_or_default();
            return Err(DbError::QuantityOverflow {
                item_id,
                current,
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let entry = Self::get(conn, character_id, item_id).await?;
        info!(
            "Character {} now holds {} of item {}",
            character_id, entry.quantity, item_id
        );
        Ok(entry)
    }

    /// Take up to `quantity` units of an item out of a stack.
    ///
    /// Asking for the whole stack or more deletes the entry.
    pub async fn remove(
        conn: &mut SqliteConnection,
        character_id: CharacterId,
        item_id: ItemId,
        quantity: u8,
    ) -> DbResult<Removal> {
        if quantity == 0 {
            return Err(DbError::InvalidQuantity);
        }

        let remaining: Option<u8> = sqlx::query_scalar(
            "UPDATE inventory
             SET quantity = quantity - ?
             WHERE character_id = ? AND item_id = ? AND quantity > ?
             RETURNING quantity",
        )
        .bind(quantity)
        .bind(character_id.get())
        .bind(item_id.get())
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await
        .during("decrement inventory item")?;

        if let Some(remaining) = remaining {
            debug!(
                "Character {} has {} of item {} left",
                character_id, remaining, item_id
            );
            return Ok(Removal::Decremented { remaining });
        }

        let result = sqlx::query(
            "DELETE FROM inventory
             WHERE character_id = ? AND item_id = ? AND quantity <= ?",
        )
        .bind(character_id.get())
        .bind(item_id.get())
        .bind(quantity)
        .execute(&mut *conn)
        .await
        .during("delete inventory item")?;

        if result.rows_affected() == 0 {
            return Err(DbError::InventoryEntryNotFound {
                character_id,
                item_id,
            });
        }

        info!("Character {} no longer holds item {}", character_id, item_id);
        Ok(Removal::Deleted)
    }

    /// Every entry owned by a character, ordered by item id.
    ///
    /// An unknown character simply owns nothing.
    pub async fn list_for_character(
        conn: &mut SqliteConnection,
        character_id: CharacterId,
    ) -> DbResult<Vec<InventoryEntry>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            "SELECT i.id, i.name, i.type, i.description, i.equippable, i.rarity,
                    i.damage, i.defense, i.heal_amount, i.mana_cost, i.duration, i.cooldown, i.capacity,
                    inv.quantity, inv.is_equipped
             FROM inventory inv
             JOIN items i ON i.id = inv.item_id
             WHERE inv.character_id = ?
             ORDER BY i.id ASC",
        )
        .bind(character_id.get())
        .fetch_all(&mut *conn)
        .await
        .during("list inventory")?;

        debug!(
            "Character {} holds {} distinct items",
            character_id,
            rows.len()
        );
        rows.into_iter().map(InventoryEntry::try_from).collect()
    }

    async fn get(
        conn: &mut SqliteConnection,
        character_id: CharacterId,
        item_id: ItemId,
    ) -> DbResult<InventoryEntry> {
        sqlx::query_as::<_, InventoryRow>(
            "SELECT i.id, i.name, i.type, i.description, i.equippable, i.rarity,
                    i.damage, i.defense, i.heal_amount, i.mana_cost, i.duration, i.cooldown, i.capacity,
                    inv.quantity, inv.is_equipped
             FROM inventory inv
             JOIN items i ON i.id = inv.item_id
             WHERE inv.character_id = ? AND inv.item_id = ?",
        )
        .bind(character_id.get())
        .bind(item_id.get())
        .fetch_optional(&mut *conn)
        .await
        .during("get inventory entry")?
        .ok_or(DbError::InventoryEntryNotFound {
            character_id,
            item_id,
        })?
        .try_into()
    }

    async fn quantity(
        conn: &mut SqliteConnection,
        character_id: CharacterId,
        item_id: ItemId,
    ) -> DbResult<Option<u8>> {
        sqlx::query_scalar(
            "SELECT quantity FROM inventory WHERE character_id = ? AND item_id = ?",
        )
        .bind(character_id.get())
        .bind(item_id.get())
        .fetch_optional(&mut *conn)
        .await
        .during("read inventory quantity")
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    #[sqlx(flatten)]
    item: ItemRow,
    quantity: u8,
    is_equipped: bool,
}

impl TryFrom<InventoryRow> for InventoryEntry {
    type Error = DbError;

    fn try_from(row: InventoryRow) -> DbResult<Self> {
        Ok(InventoryEntry {
            item: row.item.try_into()?,
            quantity: row.quantity,
            is_equipped: row.is_equipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Gallery;
    use crate::test_helpers::create_test_gallery;
    use gallery_core::{
        BodyType, Character, Class, Customization, Item, ItemType, Species, Stats,
    };

    async fn setup() -> (Gallery, CharacterId, ItemId) {
        let gallery = create_test_gallery().await.unwrap();

        let mut character = Character::new(
            "Aria",
            BodyType::TypeB,
            Species::Elf,
            Class::Ranger,
            Stats {
                strength: 10,
                dexterity: 16,
                constitution: 12,
                intelligence: 11,
                wisdom: 14,
                charisma: 9,
            },
            Customization::default(),
        );
        gallery.create(&mut character).await.unwrap();

        let mut item = Item::new("Arrow", ItemType::Ammo, "Fletched with goose", false, 1);
        gallery.create_item(&mut item).await.unwrap();

        (gallery, character.id, item.id)
    }

    async fn quantity_of(gallery: &Gallery, character_id: CharacterId, item_id: ItemId) -> Option<u8> {
        gallery
            .get_character_inventory(character_id)
            .await
            .unwrap()
            .into_iter()
            .find(|entry| entry.item.id == item_id)
            .map(|entry| entry.quantity)
    }

    #[tokio::test]
    async fn test_add_merges_into_existing_stack() {
        let (gallery, character_id, item_id) = setup().await;

        let entry = gallery
            .add_item_to_character(character_id, item_id, 2)
            .await
            .unwrap();
        assert_eq!(entry.quantity, 2);
        assert!(!entry.is_equipped);

        let entry = gallery
            .add_item_to_character(character_id, item_id, 3)
            .await
            .unwrap();
        assert_eq!(entry.quantity, 5);
        assert_eq!(entry.item.name, "Arrow");

        let inventory = gallery.get_character_inventory(character_id).await.unwrap();
        assert_eq!(inventory.len(), 1);
    }

    #[tokio::test]
    async fn test_add_up_to_max_then_overflow() {
        let (gallery, character_id, item_id) = setup().await;

        gallery
            .add_item_to_character(character_id, item_id, 200)
            .await
            .unwrap();
        let entry = gallery
            .add_item_to_character(character_id, item_id, 55)
            .await
            .unwrap();
        assert_eq!(entry.quantity, MAX_ITEM_QUANTITY);

        let err = gallery
            .add_item_to_character(character_id, item_id, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::QuantityOverflow {
                current: 255,
                requested: 1,
                ..
            }
        ));
        assert_eq!(
            quantity_of(&gallery, character_id, item_id).await,
            Some(MAX_ITEM_QUANTITY)
        );
    }

    #[tokio::test]
    async fn test_add_zero_is_rejected() {
        let (gallery, character_id, item_id) = setup().await;

        let err = gallery
            .add_item_to_character(character_id, item_id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidQuantity));
        assert_eq!(quantity_of(&gallery, character_id, item_id).await, None);
    }

    #[tokio::test]
    async fn test_add_unknown_references_conflict() {
        let (gallery, character_id, item_id) = setup().await;

        let err = gallery
            .add_item_to_character(CharacterId::new(999), item_id, 1)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let err = gallery
            .add_item_to_character(character_id, ItemId::new(999), 1)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_remove_decrements() {
        let (gallery, character_id, item_id) = setup().await;
        gallery
            .add_item_to_character(character_id, item_id, 5)
            .await
            .unwrap();

        let removal = gallery
            .remove_item_from_character(character_id, item_id, 2)
            .await
            .unwrap();
        assert_eq!(removal, Removal::Decremented { remaining: 3 });
        assert_eq!(quantity_of(&gallery, character_id, item_id).await, Some(3));
    }

    #[tokio::test]
    async fn test_remove_exact_stack_deletes() {
        let (gallery, character_id, item_id) = setup().await;
        gallery
            .add_item_to_character(character_id, item_id, 5)
            .await
            .unwrap();

        let removal = gallery
            .remove_item_from_character(character_id, item_id, 5)
            .await
            .unwrap();
        assert_eq!(removal, Removal::Deleted);
        assert_eq!(quantity_of(&gallery, character_id, item_id).await, None);
    }

    #[tokio::test]
    async fn test_remove_more_than_owned_deletes() {
        let (gallery, character_id, item_id) = setup().await;
        gallery
            .add_item_to_character(character_id, item_id, 5)
            .await
            .unwrap();

        let removal = gallery
            .remove_item_from_character(character_id, item_id, 10)
            .await
            .unwrap();
        assert_eq!(removal, Removal::Deleted);
        assert!(gallery
            .get_character_inventory(character_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_entry() {
        let (gallery, character_id, item_id) = setup().await;

        let err = gallery
            .remove_item_from_character(character_id, item_id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InventoryEntryNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_zero_is_rejected() {
        let (gallery, character_id, item_id) = setup().await;
        gallery
            .add_item_to_character(character_id, item_id, 5)
            .await
            .unwrap();

        let err = gallery
            .remove_item_from_character(character_id, item_id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidQuantity));
        assert_eq!(quantity_of(&gallery, character_id, item_id).await, Some(5));
    }

    #[tokio::test]
    async fn test_inventory_of_unknown_character_is_empty() {
        let (gallery, _, _) = setup().await;
        let inventory = gallery
            .get_character_inventory(CharacterId::new(999))
            .await
            .unwrap();
        assert!(inventory.is_empty());
    }

    #[tokio::test]
    async fn test_removing_character_clears_inventory() {
        let (gallery, character_id, item_id) = setup().await;
        gallery
            .add_item_to_character(character_id, item_id, 4)
            .await
            .unwrap();

        gallery.remove(character_id).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(gallery.pool())
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }
}
