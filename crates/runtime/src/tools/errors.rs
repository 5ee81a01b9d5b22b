use thiserror::Error;

/// Errors that can occur while resolving or running a tool call.
///
/// All of these are recoverable: the orchestrator skips the call and tells
/// the model the tool could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("missing argument '{parameter}' for {tool}")]
    MissingArgument { tool: String, parameter: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("execution failed: {0}")]
    Execution(String),
}
