//! Tool-calling conversation loop.
//!
//! One [`Orchestrator::run`] call takes a prompt from the user to a final
//! answer:
//!
//! 1. The prompt is appended to a working copy of the history and sent with
//!    the tool schema.
//! 2. A reply without tool calls is the answer.
//! 3. Otherwise every requested tool runs in order, its output is appended
//!    through the backend's tool-result adapter, and the history is sent once
//!    more *without* the schema. That reply is the answer.
//!
//! Leaving the schema off the second request bounds a call to
//! [`MAX_ROUND_TRIPS`] provider round-trips; chained tool calls are not
//! supported.

use crate::model::{Backend, Message, ModelRequest, ToolSpec};
use crate::tools::{ToolHost, render_output};
use crate::Result;

/// Upper bound on provider round-trips per orchestration call.
pub const MAX_ROUND_TRIPS: usize = 2;

/// Prefix of every tool result fed back to the model.
pub const TOOL_CONTEXT_PREFIX: &str = "Use this information in your response: ";

/// Drives one conversational turn against a backend and a tool host.
pub struct Orchestrator<'a, B, T> {
    backend: &'a B,
    tools: &'a T,
}

impl<'a, B: Backend, T: ToolHost> Orchestrator<'a, B, T> {
    pub fn new(backend: &'a B, tools: &'a T) -> Self {
        Self { backend, tools }
    }

    /// Produce the final answer to `prompt`.
    ///
    /// `history` is copied; the caller's slice is never modified. Provider
    /// failures are returned as errors. Tool failures are not: the call is
    /// skipped and the model is told the tool could not be used.
    #[tracing::instrument(
        name = "orchestrate",
        skip_all,
        fields(backend = %self.backend.name(), history = history.len())
    )]
    pub async fn run(&self, prompt: &str, history: &[Message]) -> Result<String> {
        let mut working = history.to_vec();
        working.push(Message::user(prompt));

        let reply = self.round_trip(&working, self.tools.specs(), 1).await?;
        if !reply.has_tool_calls() {
            return Ok(reply.content);
        }

        for call in &reply.tool_calls {
            let content = match self.tools.execute(call).await {
                Ok(output) => {
                    tracing::info!(tool = %call.name, "tool call completed");
                    format!("{TOOL_CONTEXT_PREFIX}{}", render_output(&output))
                }
                Err(e) => {
                    tracing::warn!(tool = %call.name, error = %e, "tool call skipped");
                    format!("The tool {} could not be used: {e}", call.name)
                }
            };
            self.backend.append_tool_result(&mut working, call, content);
        }

        let reply = self.round_trip(&working, &[], MAX_ROUND_TRIPS).await?;
        if reply.has_tool_calls() {
            tracing::warn!(
                requested = reply.tool_calls.len(),
                "tool calls after the final round-trip are ignored"
            );
        }
        Ok(reply.content)
    }

    async fn round_trip(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        round: usize,
    ) -> Result<Message> {
        tracing::debug!(round, messages = messages.len(), tools = tools.len(), "provider request");
        let response = self.backend.call(ModelRequest { messages, tools }).await?;
        tracing::debug!(
            round,
            tool_calls = response.message.tool_calls.len(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "provider reply"
        );
        Ok(response.message)
    }
}
