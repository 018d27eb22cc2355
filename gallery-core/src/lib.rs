//! gallery-core: domain types shared by the character gallery crates.

#[macro_use]
mod macros;

pub mod api_key;
pub mod characters;
pub mod config;
pub mod error;
pub mod ids;
pub mod items;

pub use api_key::{API_KEY_PREFIX, ApiKey, GeneratedApiKey, generate_api_key, hash_api_key};
pub use characters::{BodyType, Character, CharacterPage, Class, Customization, Species, Stats};
pub use config::{Config, ConfigError, load_dotenv};
pub use error::{ParseError, ValidationError};
pub use ids::{ApiKeyId, CharacterId, ItemId};
pub use items::{
    InventoryEntry, Item, ItemPool, ItemPoolError, ItemType, MAX_ITEM_QUANTITY, Removal,
};

#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
