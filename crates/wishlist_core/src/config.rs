//! Wishlist runtime configuration.
//!
//! # Responsibility
//! - Load the JSON config file used by the request layer.
//! - Fill any key the file does not set with its default.
//! - Check the shared admin secret.
//!
//! # Invariants
//! - Keys set in the file are never overwritten by defaults.
//! - An empty `admin_secret` disables admin access.

use crate::logging::{default_log_level, normalize_level};
use crate::secret::secrets_match;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_OWNER_NAME: &str = "Jemand";
const DEFAULT_DB_PATH: &str = "wishes.sqlite3";

/// Errors while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings shared by the wishlist request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WishlistConfig {
    /// Name shown as list owner.
    pub owner_name: String,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
    /// Shared secret gating admin operations.
    pub admin_secret: String,
}

impl Default for WishlistConfig {
    fn default() -> Self {
        Self {
            owner_name: DEFAULT_OWNER_NAME.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            admin_secret: String::new(),
        }
    }
}

impl WishlistConfig {
    /// Parses config JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "owner_name must not be blank".to_string(),
            ));
        }
        normalize_level(&self.log_level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }

    pub fn admin_enabled(&self) -> bool {
        !self.admin_secret.is_empty()
    }

    /// Checks a caller-supplied admin secret in constant time.
    pub fn verify_admin(&self, provided: &str) -> bool {
        secrets_match(provided, &self.admin_secret)
    }
}

/// Loads and validates a config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<WishlistConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    WishlistConfig::from_json(&raw)
}
