//! `promptModel(host, model, prompt, history)`.
//!
//! The model name picks the provider through the [`ModelCatalog`]; the turn is
//! then run by the runtime's orchestrator with [`ProjectTools`] as tool host.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use runtime::providers::OLLAMA_DEFAULT_HOST;
use runtime::{Backend, Message, OllamaBackend, OpenAiBackend, Orchestrator, Provider, ProviderKind};
use serde::Deserialize;
use serde_json::Value;

use crate::registry::{Args, FunctionDescriptor, Handler, ParamKind, Parameter};
use crate::tools::ProjectTools;
use crate::workspace::Workspace;
use crate::{CallError, Result};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Key file name inside the project's tool directory.
pub const OPENAI_KEY_FILE: &str = "openai_key.txt";

/// Model names each provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelCatalog {
    pub openai: Vec<String>,
    pub ollama: Vec<String>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            openai: vec!["gpt-4o".into(), "gpt-4o-mini".into()],
            ollama: vec!["llama3.2:latest".into()],
        }
    }
}

impl ModelCatalog {
    /// Ollama is checked first, so a name listed under both runs locally.
    pub fn provider_for(&self, model: &str) -> Option<ProviderKind> {
        if self.ollama.iter().any(|m| m == model) {
            Some(ProviderKind::Ollama)
        } else if self.openai.iter().any(|m| m == model) {
            Some(ProviderKind::OpenAi)
        } else {
            None
        }
    }
}

/// Connection settings for the provider backends.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub openai_base_url: String,
    /// Takes precedence over the environment and the key file.
    pub openai_api_key: Option<String>,
    /// Used when the caller passes an empty `host`.
    pub ollama_host: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai_base_url: runtime::providers::OPENAI_API_URL.to_string(),
            openai_api_key: None,
            ollama_host: OLLAMA_DEFAULT_HOST.to_string(),
            timeout_secs: 120,
        }
    }
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const PARAMETERS: &[Parameter] = &[
    Parameter::new("host", ParamKind::String, "Ollama host URL."),
    Parameter::new("model", ParamKind::String, "Model name."),
    Parameter::new("prompt", ParamKind::String, "The user's question."),
    Parameter::new(
        "history",
        ParamKind::Array,
        "Prior conversation as {role, content} objects.",
    ),
];

struct PromptModel {
    catalog: ModelCatalog,
    settings: ProviderSettings,
    client: reqwest::Client,
    workspace: Arc<Workspace>,
    tools: Arc<ProjectTools>,
}

impl PromptModel {
    async fn provider(&self, host: &str, model: &str) -> Result<Provider> {
        let kind = self
            .catalog
            .provider_for(model)
            .ok_or_else(|| CallError::UnknownModel(model.to_string()))?;

        Ok(match kind {
            ProviderKind::Ollama => {
                let host = if host.trim().is_empty() {
                    self.settings.ollama_host.as_str()
                } else {
                    host
                };
                OllamaBackend::builder(model)
                    .host(host)
                    .client(self.client.clone())
                    .build()
                    .into()
            }
            ProviderKind::OpenAi => {
                let key = self.openai_key().await?;
                OpenAiBackend::builder(key, model)
                    .base_url(&self.settings.openai_base_url)
                    .client(self.client.clone())
                    .build()
                    .into()
            }
        })
    }

    /// Configured key, then `OPENAI_API_KEY`, then the project's key file.
    async fn openai_key(&self) -> Result<String> {
        if let Some(key) = self.settings.openai_api_key.as_deref().filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }
        if let Ok(key) = std::env::var(OPENAI_KEY_ENV)
            && !key.trim().is_empty()
        {
            return Ok(key.trim().to_string());
        }

        let path = self.key_file().await;
        match tokio::fs::read_to_string(&path).await {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            Ok(_) => Err(CallError::MissingApiKey(path.display().to_string())),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no OpenAI key file");
                Err(CallError::MissingApiKey(path.display().to_string()))
            }
        }
    }

    async fn key_file(&self) -> PathBuf {
        Workspace::tool_dir(&self.workspace.root().await).join(OPENAI_KEY_FILE)
    }
}

fn parse_history(value: Value) -> Result<Vec<Message>> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => serde_json::from_value(other).map_err(CallError::InvalidHistory),
    }
}

#[async_trait]
impl Handler for PromptModel {
    async fn call(&self, mut args: Args) -> Result<Value> {
        let history = parse_history(args.take(3))?;
        let (host, model, prompt) = (args.str(0)?, args.str(1)?, args.str(2)?);

        let provider = self.provider(host, model).await?;
        tracing::info!(
            provider = %provider.kind(),
            backend = %provider.name(),
            history = history.len(),
            "prompting model"
        );

        let answer = Orchestrator::new(&provider, self.tools.as_ref())
            .run(prompt, &history)
            .await?;
        Ok(Value::String(answer))
    }
}

/// Build the `promptModel` descriptor.
///
/// Fails only if the HTTP client cannot be constructed.
pub fn function(
    catalog: ModelCatalog,
    settings: ProviderSettings,
    workspace: &Arc<Workspace>,
    tools: Arc<ProjectTools>,
) -> Result<FunctionDescriptor> {
    let client = reqwest::Client::builder()
        .timeout(settings.timeout())
        .build()
        .map_err(|e| CallError::Http(e.to_string()))?;

    Ok(FunctionDescriptor::new(
        "promptModel",
        "Answer a prompt with the selected model, calling project tools as needed.",
        PARAMETERS,
        PromptModel {
            catalog,
            settings,
            client,
            workspace: workspace.clone(),
            tools,
        },
    ))
}
