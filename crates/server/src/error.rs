//! Transport errors.

use std::time::Duration;

use thiserror::Error;

/// Errors from binding, serving or talking to the server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::Error),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The peer closed the connection before a full response arrived.
    #[error("connection closed by peer")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;
