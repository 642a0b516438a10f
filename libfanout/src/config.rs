//! Configuration management for Fanout

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Owner used by the CLIs when `--owner` is not given
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            platforms: Vec::new(),
        }
    }
}

fn default_owner() -> String {
    "local".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound for a single publisher call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Emulate provider latency when publishing with simulated credentials
    #[serde(default = "default_true")]
    pub simulated_latency: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            simulated_latency: true,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scheduler runs in daemon mode
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    60
}

/// Base URLs of the provider APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_linkedin")]
    pub linkedin: String,
    /// Facebook Graph API, shared by Facebook and Instagram
    #[serde(default = "default_graph")]
    pub graph: String,
    #[serde(default = "default_twitter")]
    pub twitter: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            linkedin: default_linkedin(),
            graph: default_graph(),
            twitter: default_twitter(),
        }
    }
}

fn default_linkedin() -> String {
    "https://api.linkedin.com/v2".to_string()
}

fn default_graph() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

fn default_twitter() -> String {
    "https://api.twitter.com/2".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load_or_default() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Ok(Self::default_config())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/fanout/fanout.db".to_string(),
            },
            defaults: DefaultsConfig::default(),
            dispatch: DispatchConfig::default(),
            scheduler: SchedulerConfig::default(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

/// Resolve the configuration file path using the XDG base directory layout
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("FANOUT_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("fanout").join("config.toml"))
}

/// Resolve the database path
///
/// `FANOUT_DB_PATH` wins over the configured path; `~` is expanded.
pub fn resolve_db_path(configured: Option<&str>) -> Result<PathBuf> {
    if let Ok(path) = std::env::var("FANOUT_DB_PATH") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    if let Some(path) = configured {
        return Ok(PathBuf::from(shellexpand::tilde(path).to_string()));
    }

    Ok(resolve_data_path()?.join("fanout.db"))
}

/// Resolve the data directory path using the XDG base directory layout
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("fanout"))
}
