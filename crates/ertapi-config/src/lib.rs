//! Configuration loading for ertapi.
//! Reads ertapi.toml from the current directory or the path in the ERTAPI_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_ENV_VAR: &str = "ERTAPI_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ertapi.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url()     -> String { "http://localhost:5000".to_string() }
fn default_timeout_secs() -> u64    { 30 }
fn default_user_agent()   -> String { format!("ertapi/{}", env!("CARGO_PKG_VERSION")) }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url:     default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent:   default_user_agent(),
        }
    }
}

/// Hosts the HTTP transport may talk to. Empty means "the base URL's host only".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Memoize materialized payloads per node instead of re-fetching on every read.
    #[serde(default)]
    pub payloads: bool,
}

impl Config {
    /// Load configuration from ertapi.toml.
    /// Checks ERTAPI_CONFIG (after loading `.env`) first, then the current directory.
    /// A missing file is not an error: defaults are returned.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if !Path::new(&path).exists() {
            debug!(%path, "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Same as [`Config::load`], for callers that already work in `anyhow`.
    pub fn load_default() -> anyhow::Result<Self> {
        Ok(Self::load()?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), base_url = %config.server.base_url, "Loaded config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.server.base_url).map_err(|e| {
            ConfigError::Invalid(format!("server.base_url {:?}: {}", self.server.base_url, e))
        })?;
        if base.host_str().is_none() {
            return Err(ConfigError::Invalid(format!(
                "server.base_url {:?} has no host",
                self.server.base_url
            )));
        }
        if self.server.timeout_secs == 0 {
            return Err(ConfigError::Invalid("server.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }
}
