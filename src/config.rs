//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ClientConfig;
use crate::users::POLL_INTERVAL;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ClientConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Presentation settings
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Name of the booking instance shown above the user table
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_instance_name() -> String {
    "Termine".to_string()
}

fn default_poll_interval() -> u64 {
    POLL_INTERVAL.as_secs()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl DisplayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("termine-admin").join("config.toml")),
            Some(PathBuf::from("/etc/termine-admin/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a `TERMINE_*` variable lookup
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TERMINE_API_URL") {
            self.api.base_url = url;
        }
        if let Some(timeout) = lookup("TERMINE_API_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => self.api.request_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid TERMINE_API_TIMEOUT_SECS: {}", timeout),
            }
        }

        if let Some(name) = lookup("TERMINE_INSTANCE_NAME") {
            self.display.instance_name = name;
        }
        if let Some(interval) = lookup("TERMINE_POLL_INTERVAL_SECS") {
            match interval.parse() {
                Ok(secs) => self.display.poll_interval_secs = secs,
                Err(_) => {
                    tracing::warn!("Ignoring invalid TERMINE_POLL_INTERVAL_SECS: {}", interval)
                }
            }
        }

        if let Some(level) = lookup("TERMINE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("TERMINE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Termine back-office configuration
#
# Environment variables override these settings:
# - TERMINE_API_URL
# - TERMINE_API_TIMEOUT_SECS
# - TERMINE_INSTANCE_NAME
# - TERMINE_POLL_INTERVAL_SECS
# - TERMINE_LOG_LEVEL
# - TERMINE_LOG_FORMAT

[api]
# Base URL of the admin API
base_url = "http://localhost:8000/admin_api"

# Request timeout in seconds
request_timeout_secs = 10

[display]
# Instance name shown above the user table
instance_name = "Termine"

# How often `watch` reloads the user list (seconds)
poll_interval_secs = 60

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
