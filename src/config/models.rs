use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::validation::ValidationError;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Broker address
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    11300
}

/// What to watch and how often to poll
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Seconds slept between reservation attempts. Fractional values are
    /// allowed; zero busy-polls.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
    /// Tubes to watch, in order. Duplicates are redundant but harmless.
    #[serde(default = "default_tubes")]
    pub tubes: Vec<String>,
}

impl WatchConfig {
    /// The poll delay as a `Duration`; rejects negative, NaN and
    /// out-of-range values.
    pub fn poll_interval(&self) -> Result<Duration, ValidationError> {
        Duration::try_from_secs_f64(self.delay_secs)
            .map_err(|_| ValidationError::InvalidDelay(self.delay_secs))
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            tubes: default_tubes(),
        }
    }
}

fn default_delay_secs() -> f64 {
    0.2
}

fn default_tubes() -> Vec<String> {
    vec!["default".to_string()]
}

/// Log level and destination
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Any `EnvFilter` directive (e.g. "info", "tubetap=debug").
    #[serde(default = "default_level")]
    pub level: String,
    /// `-` for the console, anything else is a file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            output: default_output(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_output() -> String {
    "-".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.broker.port, 11300);
        assert_eq!(config.watch.delay_secs, 0.2);
        assert_eq!(config.watch.tubes, vec!["default"]);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.output, "-");
    }

    #[test]
    fn test_poll_interval_conversion() {
        let watch = WatchConfig {
            delay_secs: 0.2,
            ..WatchConfig::default()
        };
        assert_eq!(watch.poll_interval().unwrap(), Duration::from_millis(200));

        let zero = WatchConfig {
            delay_secs: 0.0,
            ..WatchConfig::default()
        };
        assert_eq!(zero.poll_interval().unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_poll_interval_rejects_bad_values() {
        for delay in [-1.0, f64::NAN, f64::INFINITY, 1e300] {
            let watch = WatchConfig {
                delay_secs: delay,
                ..WatchConfig::default()
            };
            assert!(watch.poll_interval().is_err(), "accepted {delay}");
        }
    }
}
