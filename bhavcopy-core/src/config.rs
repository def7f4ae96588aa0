//! Database connection settings.
//!
//! Loaded once from a TOML file, optionally overridden from the environment,
//! then passed by value into every `connect` call. Nothing here is global.
//!
//! ```toml
//! hostname = "localhost"
//! database = "bhavcopy"
//! username = "reader"
//! password = "secret"
//! port = 5432
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5432;

pub const ENV_HOST: &str = "BHAVCOPY_DB_HOST";
pub const ENV_DATABASE: &str = "BHAVCOPY_DB_NAME";
pub const ENV_USER: &str = "BHAVCOPY_DB_USER";
pub const ENV_PASSWORD: &str = "BHAVCOPY_DB_PASSWORD";
pub const ENV_PORT: &str = "BHAVCOPY_DB_PORT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Immutable connection settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    pub hostname: String,
    pub database: String,
    pub username: String,
    #[serde(alias = "pwd", default)]
    pub password: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".into(),
            database: "bhavcopy".into(),
            username: "postgres".into(),
            password: String::new(),
            port: DEFAULT_PORT,
        }
    }
}

impl DbConfig {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `BHAVCOPY_DB_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_HOST) {
            self.hostname = v;
        }
        if let Some(v) = lookup(ENV_DATABASE) {
            self.database = v;
        }
        if let Some(v) = lookup(ENV_USER) {
            self.username = v;
        }
        if let Some(v) = lookup(ENV_PASSWORD) {
            self.password = v;
        }
        if let Some(v) = lookup(ENV_PORT) {
            self.port = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_PORT,
                value: v.clone(),
            })?;
        }
        Ok(self)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("hostname", &self.hostname)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}
