//! Function call errors.

use thiserror::Error;

/// Why a registered function could not produce a result.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CallError {
    /// No function with this name is registered.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// The positional argument count does not match the declaration.
    #[error("{function}() takes {expected} argument(s) but {given} were given")]
    Arity {
        function: &'static str,
        expected: usize,
        given: usize,
    },

    /// An argument has the wrong JSON type.
    #[error("{function}(): argument '{parameter}' must be {expected}, got {found}")]
    InvalidArgument {
        function: &'static str,
        parameter: &'static str,
        expected: &'static str,
        found: String,
    },

    /// The `history` argument is not a list of `{role, content}` messages.
    #[error("invalid conversation history: {0}")]
    InvalidHistory(#[source] serde_json::Error),

    /// The requested model is not in the catalog.
    #[error("no provider serves model '{0}'")]
    UnknownModel(String),

    /// No OpenAI API key could be found.
    #[error("OpenAI API key not configured (set OPENAI_API_KEY or {0})")]
    MissingApiKey(String),

    /// The HTTP client could not be constructed.
    #[error("http client: {0}")]
    Http(String),

    /// The conversation failed at the provider.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CallError>;
