use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use datasource_mongodb::MongoCollectionInfo;
use llm::ollama::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, OllamaClient};
use llm::openai::{DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL, OpenAiClient};
use llm::{BackendConfig, CompletionBackend};
use pipeline::ValidatorConfig;

use crate::errors::ConfigError;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LlmBackendKind {
    /// Local Ollama server.
    #[default]
    Ollama,
    /// OpenAI compatible chat completions api.
    Openai,
}

#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub kind: LlmBackendKind,
    /// Overrides the backend's default url.
    pub url: Option<String>,
    /// Overrides the backend's default model.
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl LlmConfig {
    fn backend_config(&self) -> BackendConfig {
        let (url, model) = match self.kind {
            LlmBackendKind::Ollama => (DEFAULT_OLLAMA_URL, DEFAULT_OLLAMA_MODEL),
            LlmBackendKind::Openai => (DEFAULT_OPENAI_URL, DEFAULT_OPENAI_MODEL),
        };
        BackendConfig {
            base_url: self.url.clone().unwrap_or_else(|| url.to_string()),
            model: self.model.clone().unwrap_or_else(|| model.to_string()),
            timeout: self.timeout,
        }
    }

    pub fn build_backend(&self) -> Result<Arc<dyn CompletionBackend>, ConfigError> {
        let config = self.backend_config();
        Ok(match self.kind {
            LlmBackendKind::Ollama => Arc::new(OllamaClient::new(&config)?),
            LlmBackendKind::Openai => {
                let key = self
                    .api_key
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
                    .ok_or(ConfigError::MissingApiKey)?;
                Arc::new(OpenAiClient::new(&config, key)?)
            }
        })
    }
}

/// Everything needed to start the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub mongo_uri: Option<String>,
    pub collection: MongoCollectionInfo,
    pub llm: LlmConfig,
    pub store_timeout: Option<Duration>,
    pub validator: ValidatorConfig,
    pub cors_origin: String,
}

impl ServerConfig {
    /// The connection string, if one was given and isn't blank.
    pub fn mongo_uri(&self) -> Result<&str, ConfigError> {
        self.mongo_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or(ConfigError::MissingMongoUri)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            mongo_uri: None,
            collection: MongoCollectionInfo::default(),
            llm: LlmConfig::default(),
            store_timeout: None,
            validator: ValidatorConfig::default(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}
