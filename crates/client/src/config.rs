//! Configuration management for the Cabinet client.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/cabinet/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("server_url must start with http:// or https://, got {0}")]
    InvalidServerUrl(String),

    #[error("request_timeout must be between 1 and 600 seconds, got {0}")]
    InvalidRequestTimeout(u64),

    #[error("download_throttle_ms must be at most 10000, got {0}")]
    InvalidDownloadThrottle(u64),

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the Cabinet client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Server connection configuration.
    pub server: ServerConfig,

    /// General client configuration.
    pub client: ClientConfig,

    /// Transfer behavior configuration.
    pub transfer: TransferConfig,
}

/// Server connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the Cabinet file server.
    pub url: String,

    /// Per-request timeout in seconds.
    pub request_timeout: u64,
}

/// General client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Directory for client state (user directory, session, preferences).
    pub data_dir: PathBuf,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// Transfer behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransferConfig {
    /// Directory downloaded files are written to.
    pub download_dir: PathBuf,

    /// Delay between sequential bulk downloads, in milliseconds.
    pub download_throttle_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            request_timeout: 30,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            download_throttle_ms: 100,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cabinet")
        .join("config.toml")
}

/// Returns the default data directory path.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cabinet")
}

/// Returns the default download directory path.
fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - CABINET_SERVER_URL: Override the server base URL
    /// - CABINET_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CABINET_SERVER_URL") {
            if !url.is_empty() {
                tracing::info!("Overriding server url from environment: {}", url);
                self.server.url = url;
            }
        }
        if let Ok(level) = std::env::var("CABINET_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log level from environment: {}", level);
                self.client.log_level = level;
            }
        }
    }

    /// Validates the configuration, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.url.starts_with("http://") && !self.server.url.starts_with("https://") {
            return Err(ConfigError::InvalidServerUrl(self.server.url.clone()));
        }
        if self.server.request_timeout == 0 || self.server.request_timeout > 600 {
            return Err(ConfigError::InvalidRequestTimeout(
                self.server.request_timeout,
            ));
        }
        if self.transfer.download_throttle_ms > 10_000 {
            return Err(ConfigError::InvalidDownloadThrottle(
                self.transfer.download_throttle_ms,
            ));
        }
        if !VALID_LOG_LEVELS.contains(&self.client.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.client.log_level.clone()));
        }
        Ok(())
    }

    /// Loads configuration from the given path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Loads configuration from the default path, or returns defaults when
    /// no file exists yet.
    pub fn load_default() -> Result<Self> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Saves the configuration to the given path, creating parent
    /// directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// The per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout)
    }

    /// The inter-download throttle as a [`Duration`].
    pub fn download_throttle(&self) -> Duration {
        Duration::from_millis(self.transfer.download_throttle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.server.url = "ftp://example.com".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidServerUrl("ftp://example.com".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.server.request_timeout = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRequestTimeout(0))
        );
    }

    #[test]
    fn test_validate_rejects_huge_throttle() {
        let mut config = Config::default();
        config.transfer.download_throttle_ms = 60_000;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDownloadThrottle(60_000))
        );
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = Config::default();
        config.client.log_level = "loud".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("loud".to_string()))
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.url = "https://files.example.com".to_string();
        config.transfer.download_throttle_ms = 250;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[server]\nurl = \"http://10.0.0.2:9000\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.url, "http://10.0.0.2:9000");
        assert_eq!(config.server.request_timeout, 30);
        assert_eq!(config.client.log_level, "info");
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "server = [not toml").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
