use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "TUBETAP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/tubetap.toml";
const ENV_PREFIX: &str = "TUBETAP";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(path_override: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = path_override
        .or_else(|| env::var(CONFIG_ENV_VAR).map(PathBuf::from).ok())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_from_sources(config_path)
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    // Start with defaults (handled by struct Default implementations)
    // Add TOML file if it exists (optional)
    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // Add environment variable overrides
    // TUBETAP__BROKER__HOST -> broker.host
    // TUBETAP__WATCH__TUBES is parsed as a comma-separated list
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("watch.tubes"),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.broker.port, 11300);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[broker]
host = "queue.internal"
port = 11301

[watch]
delay_secs = 1.5
tubes = ["orders", "emails"]
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.broker.host, "queue.internal");
        assert_eq!(config.broker.port, 11301);
        assert_eq!(config.watch.delay_secs, 1.5);
        assert_eq!(config.watch.tubes, vec!["orders", "emails"]);
        // untouched section keeps its defaults
        assert_eq!(config.log.level, "info");
    }

    // Note: environment override tests are omitted due to unsafe
    // env::set_var usage under parallel test execution.

    #[test]
    fn test_partial_section() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[log]
level = "debug"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.output, "-");
        assert_eq!(config.watch.tubes, vec!["default"]);
    }
}
