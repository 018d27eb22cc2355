//! Item catalog entries and inventory rows.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::ItemId;

/// Largest stack a character can hold of a single item.
pub const MAX_ITEM_QUANTITY: u8 = u8::MAX;

const ITEM_NAME_MIN_LEN: usize = 3;
const ITEM_NAME_MAX_LEN: usize = 50;
const ITEM_DESCRIPTION_MIN_LEN: usize = 3;
const ITEM_DESCRIPTION_MAX_LEN: usize = 300;

string_enum! {
    ItemType, "item type" {
        // Equipment
        Armor => "armor",
        Ring => "ring",
        Weapon => "weapon",
        Shield => "shield",
        Tool => "tool",
        AdventuringGear => "adventuring_gear",
        // Magic equipment
        Rod => "rod",
        Staff => "staff",
        Wand => "wand",
        Scroll => "scroll",
        // Consumables
        Potion => "potion",
        Ammo => "ammo",
        Consumable => "consumable",
        WondrousItem => "wondrous_item",
    }
}

/// Catalog entry.
///
/// The optional attributes are only present when they matter for the item's
/// role; `None` and `Some(0)` are different things.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub description: String,
    pub equippable: bool,
    pub rarity: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heal_amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
}

impl Item {
    /// Build an unsaved item with no optional attributes set.
    pub fn new(
        name: impl Into<String>,
        item_type: ItemType,
        description: impl Into<String>,
        equippable: bool,
        rarity: u8,
    ) -> Self {
        Self {
            id: ItemId::UNASSIGNED,
            name: name.into(),
            item_type,
            description: description.into(),
            equippable,
            rarity,
            damage: None,
            defense: None,
            heal_amount: None,
            mana_cost: None,
            duration: None,
            cooldown: None,
            capacity: None,
        }
    }

    /// True when at least one optional attribute is present and non-zero.
    pub fn has_active_attribute(&self) -> bool {
        [
            self.damage,
            self.defense,
            self.heal_amount,
            self.mana_cost,
            self.duration,
            self.cooldown,
            self.capacity,
        ]
        .into_iter()
        .any(|attr| attr.is_some_and(|value| value > 0))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let name_len = self.name.chars().count();
        if !(ITEM_NAME_MIN_LEN..=ITEM_NAME_MAX_LEN).contains(&name_len) {
            return Err(ValidationError::ItemNameLength {
                min: ITEM_NAME_MIN_LEN,
                max: ITEM_NAME_MAX_LEN,
            });
        }

        let description_len = self.description.chars().count();
        if !(ITEM_DESCRIPTION_MIN_LEN..=ITEM_DESCRIPTION_MAX_LEN).contains(&description_len) {
            return Err(ValidationError::ItemDescriptionLength {
                min: ITEM_DESCRIPTION_MIN_LEN,
                max: ITEM_DESCRIPTION_MAX_LEN,
            });
        }

        if !(1..=5).contains(&self.rarity) {
            return Err(ValidationError::Rarity(self.rarity));
        }

        if self.equippable && !self.has_active_attribute() {
            return Err(ValidationError::EquippableWithoutAttributes(
                self.name.clone(),
            ));
        }

        Ok(())
    }
}

/// An item owned by a character, joined with its catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub item: Item,
    pub quantity: u8,
    pub is_equipped: bool,
}

/// Outcome of taking items out of a character's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Removal {
    /// The entry survives with this many left.
    Decremented { remaining: u8 },
    /// The requested quantity met or exceeded the stack; the entry is gone.
    Deleted,
}

/// Fixed catalog loaded at startup and handed to the seeding operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemPool {
    pub items: Vec<Item>,
}

impl ItemPool {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Load a pool from a JSON array of items.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ItemPoolError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ItemPoolError> {
        let pool: Self = serde_json::from_str(content)?;

        if let Some(item) = pool.items.iter().find(|item| !item.id.is_assigned()) {
            return Err(ItemPoolError::MissingId(item.name.clone()));
        }

        tracing::debug!("Loaded item pool with {} items", pool.items.len());
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Item pool loading errors
#[derive(Debug, thiserror::Error)]
pub enum ItemPoolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Seed item '{0}' has no explicit id")]
    MissingId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sword() -> Item {
        let mut item = Item::new("Longsword", ItemType::Weapon, "A sharp blade", true, 3);
        item.damage = Some(8);
        item
    }

    #[test]
    fn test_zero_attribute_is_not_active() {
        let mut item = Item::new("Old Rope", ItemType::AdventuringGear, "Frayed", true, 1);
        item.capacity = Some(0);
        assert!(!item.has_active_attribute());
        assert!(item.validate().is_err());

        item.capacity = Some(10);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(sword().validate().is_ok());

        let mut item = sword();
        item.rarity = 6;
        assert_eq!(item.validate(), Err(ValidationError::Rarity(6)));

        let mut item = sword();
        item.name = "Ax".to_string();
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_item_json_uses_type_key_and_skips_absent_attributes() {
        let json = serde_json::to_value(sword()).unwrap();
        assert_eq!(json["type"], "weapon");
        assert_eq!(json["damage"], 8);
        assert!(json.get("defense").is_none());
    }

    #[test]
    fn test_item_pool_accepts_wide_attributes() {
        let json = r#"[{"id": 9, "name": "Bag of Holding", "type": "wondrous_item",
                        "description": "Bottomless", "equippable": false, "rarity": 5,
                        "capacity": 5000000000}]"#;
        let pool = ItemPool::from_json(json).unwrap();
        assert_eq!(pool.items[0].capacity, Some(5_000_000_000));
    }

    #[test]
    fn test_item_pool_requires_ids() {
        let json = r#"[
            {"id": 1, "name": "Dagger", "type": "weapon", "description": "Small blade",
             "equippable": true, "rarity": 1, "damage": 4},
            {"id": 2, "name": "Healing Potion", "type": "potion", "description": "Restores health",
             "equippable": false, "rarity": 1, "heal_amount": 10}
        ]"#;
        let pool = ItemPool::from_json(json).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.items[1].heal_amount, Some(10));

        let missing = r#"[{"name": "Dagger", "type": "weapon", "description": "Small blade",
                           "equippable": true, "rarity": 1, "damage": 4}]"#;
        assert!(matches!(
            ItemPool::from_json(missing),
            Err(ItemPoolError::MissingId(_))
        ));
    }

    #[test]
    fn test_item_pool_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("item_pool.json");
        fs::write(
            &path,
            r#"[{"id": 3, "name": "Buckler", "type": "shield", "description": "Round shield",
                 "equippable": true, "rarity": 2, "defense": 1}]"#,
        )
        .unwrap();

        let pool = ItemPool::load(&path).unwrap();
        assert_eq!(pool.items[0].id, ItemId::new(3));
        assert_eq!(pool.items[0].item_type, ItemType::Shield);
    }

    #[test]
    fn test_bundled_pool_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../item_pool.json");
        let pool = ItemPool::load(path).unwrap();

        assert!(!pool.is_empty());
        for item in &pool.items {
            assert!(item.validate().is_ok(), "{} is invalid", item.name);
        }
    }
}
