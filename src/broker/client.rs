//! Beanstalkd client over TCP.
//!
//! The watcher consumes the [`BrokerConnection`] and [`BrokerDialer`] traits
//! so the broker can be replaced with a scripted double in tests;
//! [`BeanstalkConnection`] and [`BeanstalkDialer`] are the real
//! implementations speaking the protocol from [`super::protocol`].

use super::protocol::{self, JobStats, Reply};
use super::{BrokerError, Job, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::debug;

/// One live connection to the broker. All calls are request/response on the
/// same stream; none of them time out beyond what the broker itself promises
/// for `reserve-with-timeout`.
#[async_trait]
pub trait BrokerConnection: Send {
    /// Add a tube to this connection's watch list. Returns the number of
    /// tubes now watched.
    async fn watch(&mut self, tube: &str) -> Result<u32>;

    /// Reserve the next ready job from any watched tube, waiting at most
    /// `timeout` (whole seconds; zero returns immediately). `None` means no
    /// job was available, which is not an error.
    async fn reserve_with_timeout(&mut self, timeout: Duration) -> Result<Option<Job>>;

    async fn stats_job(&mut self, id: u64) -> Result<JobStats>;

    async fn delete(&mut self, id: u64) -> Result<()>;
}

/// Connection factory, injected so the connect step is substitutable.
#[async_trait]
pub trait BrokerDialer: Send + Sync {
    type Conn: BrokerConnection;

    async fn dial(&self, host: &str, port: u16) -> Result<Self::Conn>;
}

pub struct BeanstalkConnection {
    stream: BufStream<TcpStream>,
}

impl BeanstalkConnection {
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        debug!(host, port, "tcp connection established");
        Ok(Self {
            stream: BufStream::new(stream),
        })
    }

    async fn round_trip(&mut self, request: &str) -> Result<Reply> {
        self.stream.write_all(request.as_bytes()).await?;
        self.stream.flush().await?;

        let mut line = String::new();
        let read = self.stream.read_line(&mut line).await?;
        if read == 0 {
            return Err(BrokerError::ConnectionClosed);
        }
        protocol::parse_reply(line.trim_end())
    }

    /// Read a sized data chunk plus its trailing CRLF.
    async fn read_chunk(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; len + 2];
        self.stream.read_exact(&mut buf).await?;
        buf.truncate(len);
        Ok(Bytes::from(buf))
    }
}

#[async_trait]
impl BrokerConnection for BeanstalkConnection {
    async fn watch(&mut self, tube: &str) -> Result<u32> {
        match self.round_trip(&protocol::watch(tube)).await? {
            Reply::Watching(count) => {
                debug!(tube, watched = count, "watching tube");
                Ok(count)
            }
            reply => Err(BrokerError::unexpected("watch", reply)),
        }
    }

    async fn reserve_with_timeout(&mut self, timeout: Duration) -> Result<Option<Job>> {
        match self
            .round_trip(&protocol::reserve_with_timeout(timeout))
            .await?
        {
            Reply::Reserved { id, bytes } => {
                let payload = self.read_chunk(bytes).await?;
                Ok(Some(Job { id, payload }))
            }
            Reply::TimedOut | Reply::DeadlineSoon => Ok(None),
            reply => Err(BrokerError::unexpected("reserve-with-timeout", reply)),
        }
    }

    async fn stats_job(&mut self, id: u64) -> Result<JobStats> {
        match self.round_trip(&protocol::stats_job(id)).await? {
            Reply::Ok { bytes } => {
                let body = self.read_chunk(bytes).await?;
                let body = std::str::from_utf8(&body)
                    .map_err(|e| BrokerError::MalformedStats(e.to_string()))?;
                protocol::parse_job_stats(body)
            }
            reply => Err(BrokerError::unexpected("stats-job", reply)),
        }
    }

    async fn delete(&mut self, id: u64) -> Result<()> {
        match self.round_trip(&protocol::delete(id)).await? {
            Reply::Deleted => Ok(()),
            // NOT_FOUND for a job reserved on this same connection is a
            // broker fault, not a normal outcome.
            reply => Err(BrokerError::unexpected("delete", reply)),
        }
    }
}

/// Dials a plain TCP [`BeanstalkConnection`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BeanstalkDialer;

#[async_trait]
impl BrokerDialer for BeanstalkDialer {
    type Conn = BeanstalkConnection;

    async fn dial(&self, host: &str, port: u16) -> Result<BeanstalkConnection> {
        BeanstalkConnection::connect(host, port).await
    }
}
