use thiserror::Error;

/// Errors from a provider round-trip.
///
/// None of these are handled by the orchestrator; they surface to whoever
/// asked for the answer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The provider could not be reached.
    #[error("network: {0}")]
    Network(String),

    /// The request did not complete within the client timeout.
    #[error("provider timed out: {0}")]
    Timeout(String),

    /// The provider answered with a non-success status.
    #[error("provider api: {0}")]
    Api(String),

    /// The provider reply could not be decoded.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
