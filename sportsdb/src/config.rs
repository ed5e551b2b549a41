//! Configuration for the sportsdb data layer
//!
//! The data directory is resolved with the following precedence:
//! 1. SPORTSDB_DATA_DIR environment variable
//! 2. ~/.config/sportsdb/data (production default)
//! 3. ./data (fallback for development)
//!
//! Pool size, page limits and the default transaction timeout are read from
//! `SPORTSDB_*` variables and fall back to the defaults below.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CONFIG_DIR: &str = ".config/sportsdb/data";
const DEV_DATA_DIR: &str = "./data";
const DATABASE_FILE: &str = "sportsdb.db";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Runtime settings for the driver, the transaction manager and the repositories.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub page_limits: PageLimits,
    /// Applied to managed transactions that don't set their own timeout.
    pub transaction_timeout: Option<Duration>,
}

/// Bounds applied when sanitizing pagination input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_SIZE,
            max_limit: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    /// Keeps `default_limit` within `1..=max_limit`.
    pub fn new(default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
        }
    }
}

impl DataConfig {
    /// Settings for a database file at `database_path` with default limits.
    pub fn with_database(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            page_limits: PageLimits::default(),
            transaction_timeout: None,
        }
    }

    /// Build the configuration from `SPORTSDB_*` environment variables.
    pub fn from_env() -> Self {
        let database_path = get_data_dir().join(DATABASE_FILE);
        let max_connections = env_or("SPORTSDB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let default_limit = env_or("SPORTSDB_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE);
        let max_limit = env_or("SPORTSDB_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE);
        let transaction_timeout = std::env::var("SPORTSDB_TX_TIMEOUT_MS")
            .ok()
            .and_then(|raw| parse_or_warn::<u64>("SPORTSDB_TX_TIMEOUT_MS", &raw))
            .map(Duration::from_millis);

        Self {
            database_path,
            max_connections: max_connections.max(1),
            page_limits: PageLimits::new(default_limit, max_limit),
            transaction_timeout,
        }
    }
}

/// Get the data directory for the database file.
///
/// Priority:
/// 1. SPORTSDB_DATA_DIR env variable if set
/// 2. $HOME/.config/sportsdb/data if HOME is set
/// 3. ./data as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SPORTSDB_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| parse_or_warn(key, &raw))
        .unwrap_or(default)
}

fn parse_or_warn<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}, using default", key, raw);
            None
        }
    }
}
