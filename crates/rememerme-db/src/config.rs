use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_DB_PATH: &str = "rememerme.db";
const DEFAULT_READER_POOL_SIZE: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Where the store lives and how many read connections to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub reader_pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            reader_pool_size: DEFAULT_READER_POOL_SIZE,
        }
    }
}

impl StoreConfig {
    /// Reads `REMEMERME_DB_PATH` and `REMEMERME_READER_POOL`, falling back to
    /// defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("REMEMERME_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("REMEMERME_READER_POOL") {
            config.reader_pool_size = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "REMEMERME_READER_POOL",
                value: raw.clone(),
            })?;
        }

        Ok(config)
    }
}
