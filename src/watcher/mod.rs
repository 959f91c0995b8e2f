//! The observe-and-discard loop.
//!
//! [`QueueWatcher`] owns one lazily-opened broker connection, watches a fixed
//! set of tubes, and polls them forever: sleep, try a zero-timeout
//! reservation, and when a job comes back, log its id and tube and delete it.
//! It is a diagnostic tap on queue traffic, not a real consumer: payloads
//! are never inspected and every reserved job is unconditionally deleted.
//!
//! Broker failures are fatal. Nothing here retries or reconnects; a broken
//! broker surfaces as a process exit.

use crate::broker::{protocol, BrokerConnection, BrokerDialer, BrokerError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::sleep;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("broker port must not be 0")]
    InvalidPort,

    #[error("watch set is empty: at least one tube is required")]
    EmptyWatchSet,

    #[error("invalid tube name {0:?}")]
    InvalidTubeName(String),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

pub type Result<T> = std::result::Result<T, WatcherError>;

/// Broker address. Immutable once the watcher is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
}

/// Leveled log sink the watcher emits through. The binary wires this to
/// `tracing` (see `observability::TracingLog`); tests substitute a recording
/// double. Fields are named key/value pairs attached to the message.
pub trait EventLog: Send + Sync {
    /// Lifecycle events: connection opened, watch list announced.
    fn info(&self, message: &str, fields: &[(&str, String)]);

    /// Per-job observations. One call per reserved job.
    fn notice(&self, message: &str, fields: &[(&str, String)]);
}

pub struct QueueWatcher<D: BrokerDialer> {
    endpoint: BrokerEndpoint,
    interval: Duration,
    tubes: Vec<String>,
    dialer: D,
    conn: Option<D::Conn>,
    log: Arc<dyn EventLog>,
}

impl<D: BrokerDialer> QueueWatcher<D> {
    /// Pure construction: validates its arguments and never touches the
    /// network. Duplicate tubes are allowed (watching twice is redundant but
    /// harmless), order is preserved.
    pub fn new(
        endpoint: BrokerEndpoint,
        interval: Duration,
        tubes: Vec<String>,
        dialer: D,
        log: Arc<dyn EventLog>,
    ) -> Result<Self> {
        if endpoint.port == 0 {
            return Err(WatcherError::InvalidPort);
        }
        if tubes.is_empty() {
            return Err(WatcherError::EmptyWatchSet);
        }
        if let Some(tube) = tubes.iter().find(|t| !protocol::is_valid_tube_name(t)) {
            return Err(WatcherError::InvalidTubeName(tube.clone()));
        }

        Ok(Self {
            endpoint,
            interval,
            tubes,
            dialer,
            conn: None,
            log,
        })
    }

    /// Open the broker connection if none exists yet; a second call is a
    /// no-op. Dial failures propagate unmodified, there is no retry.
    pub async fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        self.log.info(
            "broker connection",
            &[
                ("host", self.endpoint.host.clone()),
                ("port", self.endpoint.port.to_string()),
            ],
        );

        let conn = self
            .dialer
            .dial(&self.endpoint.host, self.endpoint.port)
            .await?;
        self.conn = Some(conn);
        Ok(())
    }

    /// Connect, watch every configured tube in order, then poll until
    /// `shutdown` fires. Returns `Ok(())` only on shutdown; any broker
    /// failure ends the loop immediately and propagates to the caller.
    ///
    /// Every iteration sleeps the full interval before attempting a
    /// reservation, including the iteration right after a job was processed,
    /// so throughput is capped at one job per interval.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        self.connect().await?;

        let Self {
            conn,
            interval,
            tubes,
            log,
            ..
        } = self;
        let conn = conn.as_mut().expect("connect() opened the connection");

        log.info(
            "watch loop starting",
            &[
                ("delay_secs", interval.as_secs_f64().to_string()),
                ("tubes", tubes.join(",")),
            ],
        );

        for tube in tubes.iter() {
            conn.watch(tube).await?;
        }

        loop {
            // The sleep is the only suspension point besides broker I/O; a
            // shutdown signal wins over it, so cancellation is observed at
            // the top of every iteration. A dropped sender counts as
            // shutdown too.
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    log.info("shutdown signal received", &[]);
                    return Ok(());
                }
                _ = sleep(*interval) => {}
            }

            let Some(job) = conn.reserve_with_timeout(Duration::ZERO).await? else {
                continue;
            };

            let stats = conn.stats_job(job.id).await?;
            log.notice(
                "new job",
                &[("id", job.id.to_string()), ("tube", stats.tube.clone())],
            );
            conn.delete(job.id).await?;
        }
    }
}
