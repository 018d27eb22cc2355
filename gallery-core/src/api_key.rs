//! API key secrets.
//!
//! Raw keys are shown to their owner exactly once. Only the SHA-256 hex digest
//! is ever persisted or compared.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ids::ApiKeyId;

/// Prefix that makes gallery keys easy to spot in configs and logs.
pub const API_KEY_PREFIX: &str = "cg_";

/// Stored API key metadata (never the raw key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub name: String,
    pub key_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// A freshly generated key: the raw secret and the hash to store.
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    pub raw_key: String,
    pub key_hash: String,
}

/// Generate a new random API key.
pub fn generate_api_key() -> GeneratedApiKey {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    let raw_key = format!("{API_KEY_PREFIX}{}", hex::encode(bytes));
    let key_hash = hash_api_key(&raw_key);
    GeneratedApiKey { raw_key, key_hash }
}

/// One-way hash used for storage and lookup.
pub fn hash_api_key(raw_key: &str) -> String {
    hex::encode(Sha256::digest(raw_key.as_bytes()))
}
