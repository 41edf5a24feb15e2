//! Service configuration
//!
//! Sources, later ones winning:
//! 1. `.env` (via dotenvy, optional)
//! 2. TOML file at `$LINKFEED_CONFIG`, or `./linkfeed.toml` when present
//! 3. Environment: `LINKFEED_BIND_ADDR`, `DATABASE_URL`, `LINKFEED_MAX_TAKE`, `LINKFEED_LOG`

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::User;
use crate::pagination::DEFAULT_MAX_TAKE;

const DEFAULT_CONFIG_FILE: &str = "linkfeed.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Failed to load .env: {0}")]
    DotEnv(#[source] dotenvy::Error),
}

/// Runtime configuration for the link service
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind to (default: 127.0.0.1:4000)
    pub bind_addr: SocketAddr,

    /// Postgres URL; the in-memory store is used when unset
    pub database_url: Option<String>,

    pub max_connections: u32,

    /// Largest accepted `take` on the feed
    pub max_take: u32,

    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: String,

    /// Users known to the in-memory store
    pub users: Vec<User>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 4000)),
            database_url: None,
            max_connections: 5,
            max_take: DEFAULT_MAX_TAKE,
            log_filter: "info".to_string(),
            users: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from `.env`, an optional TOML file, and the environment
    pub fn load() -> Result<Self, ConfigError> {
        optional_dotenv(dotenvy::dotenv())?;

        let mut config = match env::var_os("LINKFEED_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("LINKFEED_BIND_ADDR") {
            self.bind_addr = addr.parse().map_err(|e| ConfigError::Invalid {
                key: "LINKFEED_BIND_ADDR".to_string(),
                reason: format!("{}", e),
            })?;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(max_take) = lookup("LINKFEED_MAX_TAKE") {
            self.max_take = max_take.parse().map_err(|e| ConfigError::Invalid {
                key: "LINKFEED_MAX_TAKE".to_string(),
                reason: format!("{}", e),
            })?;
        }
        if let Some(filter) = lookup("LINKFEED_LOG") {
            self.log_filter = filter;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_take == 0 || self.max_take > i32::MAX as u32 {
            return Err(ConfigError::Invalid {
                key: "max_take".to_string(),
                reason: "must be between 1 and 2147483647".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// A missing `.env` is fine; one that exists but can't be read or parsed is not
fn optional_dotenv<T>(loaded: dotenvy::Result<T>) -> Result<(), ConfigError> {
    match loaded {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::DotEnv(err)),
    }
}
