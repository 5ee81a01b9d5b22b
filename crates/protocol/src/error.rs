//! Protocol error types.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The frame exceeded the configured maximum length.
    #[error("frame too large (max {max} bytes)")]
    FrameTooLarge { max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
