//! Log-sink selection and the tracing-backed event log.
//!
//! The watcher core only knows the `EventLog` trait; this module provides
//! the production implementation on top of `tracing` and wires the global
//! subscriber to the configured sink (console or file).

use crate::watcher::EventLog;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as fmt_layer, EnvFilter};

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("invalid log filter {directive:?}")]
    BadFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("failed to open log file {path}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where log lines go. `-` (or an empty string) selects the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    File(PathBuf),
}

impl LogOutput {
    pub fn parse(value: &str) -> Self {
        match value {
            "" | "-" => LogOutput::Stderr,
            path => LogOutput::File(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogOutput::Stderr => write!(f, "-"),
            LogOutput::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `level` is any `EnvFilter` directive (`info`, `debug`, `tubetap=debug`);
/// a `RUST_LOG` environment variable takes precedence when set. For file
/// output the returned guard must be held for the process lifetime or
/// buffered lines are lost on exit.
pub fn init(level: &str, output: &LogOutput) -> Result<Option<WorkerGuard>, ObservabilityError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|source| ObservabilityError::BadFilter {
            directive: level.to_string(),
            source,
        })?;

    match output {
        LogOutput::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer::layer().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
        LogOutput::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ObservabilityError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer::layer().with_writer(writer).with_ansi(false))
                .init();
            Ok(Some(guard))
        }
    }
}

/// `EventLog` over `tracing`. There is no NOTICE level in `tracing`, so
/// per-job notices are emitted at INFO against the `tubetap::job` target,
/// which lets a filter directive single them out.
pub struct TracingLog;

impl EventLog for TracingLog {
    fn info(&self, message: &str, fields: &[(&str, String)]) {
        tracing::info!(target: "tubetap", "{message}{}", FieldList(fields));
    }

    fn notice(&self, message: &str, fields: &[(&str, String)]) {
        tracing::info!(target: "tubetap::job", "{message}{}", FieldList(fields));
    }
}

struct FieldList<'a>(&'a [(&'a str, String)]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.0 {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}
