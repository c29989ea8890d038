//! Externally supplied runtime configuration.
//!
//! # Responsibility
//! - Carry the opaque store connection string to the storage bootstrap.
//! - Resolve logging settings from the process environment.
//!
//! # Invariants
//! - Loading configuration never touches the database or the file system.
//! - Blank environment values are treated as unset.

use crate::logging::default_log_level;
use std::time::Duration;

/// Environment variable holding the SQLite path (or `:memory:`).
pub const DATABASE_URL_ENV: &str = "TERRITORIES_DATABASE_URL";
/// Environment variable holding the log level (`trace|debug|info|warn|error`).
pub const LOG_LEVEL_ENV: &str = "TERRITORIES_LOG_LEVEL";
/// Environment variable holding an absolute log directory.
pub const LOG_DIR_ENV: &str = "TERRITORIES_LOG_DIR";

pub const IN_MEMORY_DATABASE_URL: &str = ":memory:";
pub const DEFAULT_DATABASE_URL: &str = "territories.sqlite3";
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Store connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Opaque connection string: a SQLite file path or `:memory:`.
    pub database_url: String,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_DATABASE_URL)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.trim() == IN_MEMORY_DATABASE_URL
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_URL)
    }
}

/// Process-level configuration for binaries embedding the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub log_level: String,
    /// File logging stays disabled when no directory is configured.
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Used by `from_env` and by tests that must not mutate the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            store: StoreConfig::new(
                non_blank(DATABASE_URL_ENV).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            ),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_blank(LOG_DIR_ENV),
        }
    }
}
