//! Wire codec for the beanstalkd text protocol.
//!
//! Only the commands the watcher needs are covered: `watch`,
//! `reserve-with-timeout`, `delete` and `stats-job`. Requests are CRLF-framed
//! ASCII lines; replies are a status line optionally followed by a sized data
//! chunk (job payload or a stats mapping).

use super::BrokerError;
use std::collections::HashMap;
use std::time::Duration;

/// Longest tube name the broker accepts, in bytes.
pub const TUBE_NAME_MAX_BYTES: usize = 200;

/// Tube names are ASCII alphanumerics plus `- + / ; . $ _ ( )`, must not
/// start with a hyphen, and are capped at [`TUBE_NAME_MAX_BYTES`].
pub fn is_valid_tube_name(name: &str) -> bool {
    if name.is_empty() || name.len() > TUBE_NAME_MAX_BYTES || name.starts_with('-') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || "-+/;.$_()".contains(c))
}

pub fn watch(tube: &str) -> String {
    format!("watch {tube}\r\n")
}

/// Timeout is whole seconds on the wire; zero means "return immediately".
pub fn reserve_with_timeout(timeout: Duration) -> String {
    format!("reserve-with-timeout {}\r\n", timeout.as_secs())
}

pub fn delete(id: u64) -> String {
    format!("delete {id}\r\n")
}

pub fn stats_job(id: u64) -> String {
    format!("stats-job {id}\r\n")
}

/// Status line of a broker reply, with the CRLF already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Watching(u32),
    /// Followed by a `bytes`-long payload chunk.
    Reserved { id: u64, bytes: usize },
    TimedOut,
    DeadlineSoon,
    Deleted,
    NotFound,
    /// Followed by a `bytes`-long data chunk (stats mapping).
    Ok { bytes: usize },
}

pub fn parse_reply(line: &str) -> Result<Reply, BrokerError> {
    let mut tokens = line.split_whitespace();
    let bad = || BrokerError::BadReply(line.to_string());

    match tokens.next().ok_or_else(bad)? {
        "WATCHING" => {
            let count = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;
            Ok(Reply::Watching(count))
        }
        "RESERVED" => {
            let id = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;
            let bytes = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;
            Ok(Reply::Reserved { id, bytes })
        }
        "TIMED_OUT" => Ok(Reply::TimedOut),
        "DEADLINE_SOON" => Ok(Reply::DeadlineSoon),
        "DELETED" => Ok(Reply::Deleted),
        "NOT_FOUND" => Ok(Reply::NotFound),
        "OK" => {
            let bytes = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;
            Ok(Reply::Ok { bytes })
        }
        "OUT_OF_MEMORY" | "INTERNAL_ERROR" | "BAD_FORMAT" | "UNKNOWN_COMMAND" => {
            Err(BrokerError::Server(line.to_string()))
        }
        _ => Err(bad()),
    }
}

/// Broker-reported statistics for a single job.
///
/// The `stats-job` data chunk is a flat mapping (`---` header line, then one
/// `key: value` pair per line). Counters the broker omits default to zero;
/// only `tube` is mandatory since it is what the watcher reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobStats {
    pub id: u64,
    pub tube: String,
    pub state: String,
    pub age: u64,
    pub reserves: u64,
    pub timeouts: u64,
    pub releases: u64,
    pub buries: u64,
    pub kicks: u64,
}

pub fn parse_job_stats(body: &str) -> Result<JobStats, BrokerError> {
    let mut fields: HashMap<&str, &str> = HashMap::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line == "---" {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| BrokerError::MalformedStats(line.to_string()))?;
        fields.insert(key.trim(), value.trim());
    }

    let tube = fields
        .get("tube")
        .ok_or_else(|| BrokerError::MalformedStats("missing tube".to_string()))?
        .to_string();

    let counter = |key: &str| -> u64 {
        fields
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    };

    Ok(JobStats {
        id: counter("id"),
        tube,
        state: fields.get("state").unwrap_or(&"").to_string(),
        age: counter("age"),
        reserves: counter("reserves"),
        timeouts: counter("timeouts"),
        releases: counter("releases"),
        buries: counter("buries"),
        kicks: counter("kicks"),
    })
}
