use super::models::Config;
use crate::broker::protocol::is_valid_tube_name;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("broker.port must be between 1 and 65535")]
    InvalidPort,

    #[error("watch.delay_secs must be a finite, non-negative number of seconds (got {0})")]
    InvalidDelay(f64),

    #[error("watch.tubes is empty (at least one tube is required)")]
    EmptyWatchSet,

    #[error("invalid tube name {0:?}")]
    InvalidTubeName(String),
}

/// Validate a fully layered configuration. Runs after every source,
/// including CLI flag overrides, has been applied.
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.broker.port == 0 {
        return Err(ValidationError::InvalidPort);
    }

    config.watch.poll_interval()?;

    if config.watch.tubes.is_empty() {
        return Err(ValidationError::EmptyWatchSet);
    }
    if let Some(tube) = config
        .watch
        .tubes
        .iter()
        .find(|t| !is_valid_tube_name(t))
    {
        return Err(ValidationError::InvalidTubeName(tube.clone()));
    }

    Ok(())
}
