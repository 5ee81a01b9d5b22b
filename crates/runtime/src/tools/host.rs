//! Tool host trait.

use crate::model::{ToolCall, ToolSpec};
use crate::tools::ToolError;
use serde_json::Value;
use std::future::Future;

/// Provides the tool schema and executes tool calls.
pub trait ToolHost: Send + Sync {
    /// The model-facing schema, fixed for the host's lifetime.
    fn specs(&self) -> &[ToolSpec];

    /// Resolve a call by name, order its named arguments and run it.
    fn execute(&self, call: &ToolCall) -> impl Future<Output = Result<Value, ToolError>> + Send;
}

/// Render a tool's return value the way it is shown to the model.
///
/// Strings are inserted verbatim, everything else as compact JSON.
pub fn render_output(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
