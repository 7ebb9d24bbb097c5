//! Configuration loading and management.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server identity.
    pub server: ServerConfig,
    /// Session behavior.
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Agent string announced in the handshake response (e.g. "weft/1.0").
    pub agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            agent: format!("weft/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Session behavior configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Database targeted when a request names none.
    #[serde(default = "default_database")]
    pub default_database: String,
    /// Whether run/begin/route may carry an impersonated user.
    #[serde(default = "default_true")]
    pub allow_impersonation: bool,
    /// When set, bookmarks on a single request must all resolve to one
    /// database; a spread is answered with a bookmark-mixture failure.
    #[serde(default)]
    pub single_database_bookmarks: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_database: default_database(),
            allow_impersonation: true,
            single_database_bookmarks: false,
        }
    }
}

fn default_database() -> String {
    "graph".to_string()
}

fn default_true() -> bool {
    true
}
