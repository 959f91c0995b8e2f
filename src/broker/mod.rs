//! Broker client capability: the connection traits the watcher consumes and
//! the beanstalkd implementation behind them.

pub mod client;
pub mod protocol;

pub use client::{BeanstalkConnection, BeanstalkDialer, BrokerConnection, BrokerDialer};
pub use protocol::JobStats;

use bytes::Bytes;
use protocol::Reply;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed by broker")]
    ConnectionClosed,

    #[error("broker reported {0}")]
    Server(String),

    #[error("unparseable reply line: {0:?}")]
    BadReply(String),

    #[error("unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: &'static str, reply: String },

    #[error("malformed stats-job data: {0}")]
    MalformedStats(String),
}

impl BrokerError {
    fn unexpected(command: &'static str, reply: Reply) -> Self {
        BrokerError::UnexpectedReply {
            command,
            reply: format!("{reply:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;

/// A reserved job: the broker-assigned id plus the raw payload. The payload
/// is carried along but never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub payload: Bytes,
}
