//! Configuration management for tubetap
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority among file sources)
//!
//! CLI flags are folded in by the binary on top of the loaded configuration,
//! which is why [`Config::validate`] is public and is re-run after the flags
//! have been applied.
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the
//! pattern `TUBETAP__<section>__<key>`:
//!
//! - `TUBETAP__BROKER__HOST=queue.internal`
//! - `TUBETAP__BROKER__PORT=11301`
//! - `TUBETAP__WATCH__TUBES=orders,emails`
//!
//! # Configuration File
//!
//! By default the configuration is loaded from `config/tubetap.toml`. This
//! can be overridden with the `--config` flag or the `TUBETAP_CONFIG`
//! environment variable.

mod models;
mod sources;
mod validation;

pub use models::{BrokerConfig, Config, LogConfig, WatchConfig};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment) and validate.
    ///
    /// `path_override` wins over the `TUBETAP_CONFIG` environment variable
    /// and the default path; a missing file is not an error.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path_override)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Re-validate after out-of-band mutation (CLI flag overrides).
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[watch]
tubes = ["orders"]
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.watch.tubes, vec!["orders"]);
        assert_eq!(config.broker.port, 11300);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[watch]
delay_secs = -1.0
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidDelay(_))
        ));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[broker]
host = "queue.internal"
port = 11301

[watch]
delay_secs = 0.5
tubes = ["orders", "emails", "webhooks"]

[log]
level = "tubetap=debug"
output = "/var/log/tubetap.log"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.broker.host, "queue.internal");
        assert_eq!(config.broker.port, 11301);
        assert_eq!(config.watch.tubes.len(), 3);
        assert_eq!(config.log.level, "tubetap=debug");
        assert_eq!(config.log.output, "/var/log/tubetap.log");
    }
}
