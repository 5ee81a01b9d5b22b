//! Ollama chat backend.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Role, ToolCall, ToolSpec, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OLLAMA_DEFAULT_HOST: &str = "http://localhost:11434";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunction<'a>,
}

#[derive(Debug, Serialize)]
struct ApiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    message: ApiResponseMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    function: ApiFunctionCall,
}

/// Ollama sends arguments as an object, not a string.
#[derive(Debug, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaBackendBuilder {
    host: String,
    model: String,
    client: Option<reqwest::Client>,
}

impl OllamaBackendBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            host: OLLAMA_DEFAULT_HOST.to_string(),
            model: model.into(),
            client: None,
        }
    }

    /// Server address, e.g. `http://localhost:11434/`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Share an HTTP client (timeouts, connection pool).
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> OllamaBackend {
        OllamaBackend {
            client: self.client.unwrap_or_default(),
            endpoint: format!("{}/api/chat", self.host.trim_end_matches('/')),
            host: self.host,
            model: self.model,
        }
    }
}

/// Ollama `/api/chat` backend (non-streaming).
pub struct OllamaBackend {
    client: reqwest::Client,
    host: String,
    model: String,
    endpoint: String,
}

impl OllamaBackend {
    pub fn builder(model: impl Into<String>) -> OllamaBackendBuilder {
        OllamaBackendBuilder::new(model)
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool<'_> {
        ApiTool {
            tool_type: "function",
            function: ApiFunction {
                name: &spec.name,
                description: &spec.description,
                parameters: &spec.parameters,
            },
        }
    }
}

impl std::fmt::Display for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ollama({}, host={})", self.model, self.host)
    }
}

impl Backend for OllamaBackend {
    fn name(&self) -> String {
        self.to_string()
    }

    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = ApiRequest {
            model: &self.model,
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&api_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let tool_calls = api_response
            .message
            .tool_calls
            .into_iter()
            .map(|c| ToolCall::new(c.function.name, c.function.arguments))
            .collect();
        let message = Message::assistant(api_response.message.content).with_tool_calls(tool_calls);

        Ok(ModelResponse {
            message,
            usage: Usage {
                input_tokens: api_response.prompt_eval_count,
                output_tokens: api_response.eval_count,
            },
        })
    }

    /// Tool results go back under the dedicated `tool` role.
    fn append_tool_result(&self, history: &mut Vec<Message>, _call: &ToolCall, content: String) {
        history.push(Message::new(Role::Tool, content));
    }
}
