//! LLM provider adapters.
//!
//! Each provider implements [`Backend`] for its API. [`Provider`] is the
//! closed set the server can select between at request time.

mod ollama;
mod openai;

pub use ollama::{OLLAMA_DEFAULT_HOST, OllamaBackend, OllamaBackendBuilder};
pub use openai::{OPENAI_API_URL, OpenAiBackend, OpenAiBackendBuilder};

use crate::model::{Backend, Message, ModelError, ModelRequest, ModelResponse, ToolCall};

/// Which provider family a model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Ollama,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// A configured backend of any supported provider.
pub enum Provider {
    OpenAi(OpenAiBackend),
    Ollama(OllamaBackend),
}

impl Provider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Ollama(_) => ProviderKind::Ollama,
        }
    }
}

impl From<OpenAiBackend> for Provider {
    fn from(backend: OpenAiBackend) -> Self {
        Self::OpenAi(backend)
    }
}

impl From<OllamaBackend> for Provider {
    fn from(backend: OllamaBackend) -> Self {
        Self::Ollama(backend)
    }
}

impl Backend for Provider {
    fn name(&self) -> String {
        match self {
            Self::OpenAi(b) => b.name(),
            Self::Ollama(b) => b.name(),
        }
    }

    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        match self {
            Self::OpenAi(b) => b.call(request).await,
            Self::Ollama(b) => b.call(request).await,
        }
    }

    fn append_tool_result(&self, history: &mut Vec<Message>, call: &ToolCall, content: String) {
        match self {
            Self::OpenAi(b) => b.append_tool_result(history, call, content),
            Self::Ollama(b) => b.append_tool_result(history, call, content),
        }
    }
}
