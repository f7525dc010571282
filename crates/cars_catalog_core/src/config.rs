//! Process configuration for the catalog core.
//!
//! # Responsibility
//! - Describe database, pool and logging settings in one serde-friendly shape.
//! - Layer `CARS_CATALOG_*` environment variables over built-in defaults.
//!
//! # Invariants
//! - Malformed values are reported, never silently defaulted.
//! - A loaded configuration always has a database path and a non-empty pool.

use figment::providers::{Env, Serialized};
use figment::value::{Uncased, UncasedStr};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const DB_FILE_NAME: &str = "cars_catalog.sqlite3";

/// Environment prefix, e.g. `CARS_CATALOG_DB_PATH`.
pub const ENV_PREFIX: &str = "CARS_CATALOG_";

const POOL_ENV_KEYS: &[&str] = &[
    "max_connections",
    "min_idle",
    "connection_timeout_ms",
    "busy_timeout_ms",
];

#[derive(Debug)]
pub enum ConfigError {
    /// A provider could not be read or a value has the wrong type.
    Load(Box<figment::Error>),
    /// Value parsed but is not usable.
    Invalid { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "cannot load configuration: {err}"),
            Self::Invalid { key, message } => {
                write!(f, "invalid configuration `{key}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err.as_ref()),
            Self::Invalid { .. } => None,
        }
    }
}

/// Connection pool sizing and timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept open while idle.
    #[serde(default = "default_min_idle")]
    pub min_idle: u32,
    /// How long a caller waits for a free connection.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// How long SQLite waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    8
}

fn default_min_idle() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_idle: default_min_idle(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Top-level settings consumed by process wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_log_level_owned")]
    pub log_level: String,
    /// Rolling log directory. `None` logs to stderr.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub pool: PoolConfig,
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DB_FILE_NAME)
}

fn default_log_level_owned() -> String {
    crate::logging::default_log_level().to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level_owned(),
            log_dir: None,
            pool: PoolConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Defaults overlaid with `CARS_CATALOG_*` environment variables.
    ///
    /// Pool settings are flat in the environment
    /// (`CARS_CATALOG_MAX_CONNECTIONS`) and nested under `pool` here.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).map(env_key_path))
    }

    /// Builds configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extracts and validates configuration from any provider stack.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment
            .extract()
            .map_err(|err| ConfigError::Load(Box::new(err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "db_path",
                message: "must not be empty".to_string(),
            });
        }
        if self.pool.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "pool.max_connections",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn env_key_path(key: &UncasedStr) -> Uncased<'_> {
    let key = key.as_str().to_ascii_lowercase();
    if POOL_ENV_KEYS.contains(&key.as_str()) {
        format!("pool.{key}").into()
    } else {
        key.into()
    }
}
