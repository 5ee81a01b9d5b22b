//! Tool execution boundary between the model loop and local functions.

pub mod errors;
mod host;

pub use errors::ToolError;
pub use host::{ToolHost, render_output};
