//! Process configuration resolved from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `FOLIO_DB_PATH` | `<temp dir>/folio.sqlite3` |
//! | `FOLIO_LOG_LEVEL` | `debug` in debug builds, `info` otherwise |
//! | `FOLIO_LOG_DIR` | unset (file logging disabled) |
//! | `FOLIO_CACHE_STALE_MS` | `300000` |
//!
//! Blank values are treated as unset.

use crate::cache::DEFAULT_STALE_TIME;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_ENV: &str = "FOLIO_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "FOLIO_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "FOLIO_LOG_DIR";
pub const CACHE_STALE_MS_ENV: &str = "FOLIO_CACHE_STALE_MS";

const DEFAULT_DB_FILE_NAME: &str = "folio.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "`{key}` must be a non-negative integer, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolioConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<String>,
    pub cache_stale_time: Duration,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            cache_stale_time: DEFAULT_STALE_TIME,
        }
    }
}

impl FolioConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        config.log_dir = read(LOG_DIR_ENV);
        if let Some(raw) = read(CACHE_STALE_MS_ENV) {
            let millis = raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                key: CACHE_STALE_MS_ENV,
                value: raw.clone(),
            })?;
            config.cache_stale_time = Duration::from_millis(millis);
        }
        Ok(config)
    }
}
