//! Model runtime: provider backends, the tool host boundary and the
//! tool-calling orchestrator.
//!
//! # Overview
//!
//! - **Backend**: a trait over LLM providers ([`OpenAiBackend`],
//!   [`OllamaBackend`]), including how each one wants tool results attributed
//!   in the conversation history.
//! - **ToolHost**: the schema offered to the model and the executor for the
//!   calls it requests.
//! - **Orchestrator**: runs one prompt through at most two provider
//!   round-trips and returns the final text.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{Message, OllamaBackend, Orchestrator};
//!
//! # async fn example(tools: impl runtime::ToolHost) -> runtime::Result<()> {
//! let backend = OllamaBackend::builder("llama3.2:latest").build();
//! let history = vec![Message::system("You answer licensing questions.")];
//! let answer = Orchestrator::new(&backend, &tools)
//!     .run("Which dependencies does my project use?", &history)
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod error;
pub mod model;
mod orchestrator;
pub mod providers;
pub mod tools;

pub use error::{Error, Result};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Role, ToolCall, ToolSpec, Usage,
};
pub use orchestrator::{MAX_ROUND_TRIPS, Orchestrator, TOOL_CONTEXT_PREFIX};
pub use providers::{OllamaBackend, OpenAiBackend, Provider, ProviderKind};
pub use tools::{ToolError, ToolHost, render_output};
