//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The tracing subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),

    /// `call` arguments are not a JSON array.
    #[error("arguments must be a JSON array: {0}")]
    InvalidArgs(#[source] serde_json::Error),

    /// The function registry could not be built.
    #[error(transparent)]
    Functions(#[from] functions::CallError),

    /// Binding, serving or talking to the server failed.
    #[error(transparent)]
    Server(#[from] server::Error),

    #[error(transparent)]
    Protocol(#[from] protocol::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
