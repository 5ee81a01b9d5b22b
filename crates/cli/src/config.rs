//! Configuration loading from license-server.toml.

use std::path::{Path, PathBuf};

use functions::{ModelCatalog, ProviderSettings};
use serde::Deserialize;

/// Top-level configuration. Every section and field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address and framing limits.
    pub server: ServerConfig,

    /// Project root used when neither `--project` nor
    /// `LICENSE_TOOL_PROJECT` is set.
    pub project: Option<PathBuf>,

    pub logging: LoggingConfig,

    /// Model names served by each provider.
    pub models: ModelCatalog,

    pub providers: ProviderSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            max_frame_bytes: protocol::DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `server=debug`. `RUST_LOG` wins.
    pub level: String,

    /// Log file; defaults to `.license-tool/python_interaction.log` in the
    /// project root.
    pub file: Option<PathBuf>,

    /// Rotate the file once it reaches this size.
    pub max_bytes: u64,

    /// Rotated files to keep.
    pub backups: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_bytes: 10 * 1024 * 1024,
            backups: 5,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.max_frame_bytes, 1024 * 1024);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.logging.backups, 5);
        assert_eq!(config.models, ModelCatalog::default());
        assert_eq!(config.providers.timeout_secs, 120);
        assert!(config.project.is_none());
    }

    #[test]
    fn sections_override_individually() {
        let config = Config::parse(
            r#"
            project = "/work/app"

            [server]
            port = 10001

            [logging]
            level = "server=debug,info"
            backups = 2

            [models]
            ollama = ["llama3.2:latest", "qwen2.5:7b"]

            [providers]
            ollama_host = "http://gpu-box:11434"
            timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.project.as_deref(), Some(Path::new("/work/app")));
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 10001);
        assert_eq!(config.logging.level, "server=debug,info");
        assert_eq!(config.logging.backups, 2);
        assert_eq!(config.logging.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.models.ollama.len(), 2);
        assert_eq!(config.models.openai, ModelCatalog::default().openai);
        assert_eq!(config.providers.ollama_host, "http://gpu-box:11434");
        assert_eq!(config.providers.timeout_secs, 30);
    }

    #[test]
    fn rejects_wrong_types() {
        let err = Config::parse("[server]\nport = \"ninety\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
