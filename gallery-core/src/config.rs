use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_ITEM_POOL_PATH: &str = "item_pool.json";

/// Load .env file if it exists (called automatically when using `from_env`)
pub fn load_dotenv() {
    // Silently ignore errors (file might not exist)
    let _ = dotenvy::dotenv();
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database location (default: <data dir>/character-gallery/gallery.sqlite3)
    pub database_url: String,
    /// Pool size (default: 5)
    pub max_connections: u32,
    /// Deadline applied to every store operation (default: 5s)
    pub operation_timeout: Duration,
    /// JSON file holding the default item catalog (default: item_pool.json)
    pub item_pool_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function automatically loads a .env file from the project root if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();

        Self::from_env_inner()
    }

    /// Internal method to load from env without loading .env
    fn from_env_inner() -> Result<Self, ConfigError> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => Self::default_database_path()?.display().to_string(),
        };

        Ok(Self {
            database_url,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            operation_timeout: Duration::from_millis(
                parse_var("OPERATION_TIMEOUT_MS")?.unwrap_or(DEFAULT_OPERATION_TIMEOUT_MS),
            ),
            item_pool_path: env::var("ITEM_POOL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_ITEM_POOL_PATH)),
        })
    }

    /// Default database file in the platform data directory
    pub fn default_database_path() -> Result<PathBuf, ConfigError> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
        Ok(data_dir.join("character-gallery").join("gallery.sqlite3"))
    }

    /// Database file path with any `sqlite:` scheme stripped
    pub fn database_path(&self) -> PathBuf {
        let raw = self.database_url.as_str();
        let raw = raw
            .strip_prefix("sqlite://")
            .or_else(|| raw.strip_prefix("sqlite:"))
            .unwrap_or(raw);
        PathBuf::from(raw)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar {
                name: name.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No data directory found and DATABASE_URL is not set")]
    NoDataDir,
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidVar { name: String, value: String },
}
