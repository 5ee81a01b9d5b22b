use crate::model::ModelError;
use thiserror::Error;

/// Errors surfaced by the runtime to its caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The provider round-trip failed; the turn has no answer.
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
