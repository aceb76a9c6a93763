//! Client for a local Ollama server.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::{LlmError, Result};
use crate::{BackendConfig, CompletionBackend, Message, read_response};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

const BACKEND_NAME: &str = "ollama";

#[derive(Debug, Serialize, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub stream: bool,
    /// Ask the model to constrain its output to json.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub model: Option<String>,
    pub message: Option<Message>,
    pub done: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    chat_url: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &BackendConfig) -> Result<OllamaClient> {
        let client = config.client_builder().build()?;
        Ok(OllamaClient {
            client,
            chat_url: config.endpoint("api/chat")?,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let req = ChatRequest {
            model: &self.model,
            messages: vec![Message::system(system), Message::user(prompt)],
            stream: false,
            format: Some("json"),
        };

        debug!(url = %self.chat_url, model = %self.model, "sending chat request");

        let resp = self
            .client
            .post(self.chat_url.clone())
            .json(&req)
            .send()
            .await?;

        let resp: ChatResponse = read_response(BACKEND_NAME, resp).await?;
        resp.message
            .map(|m| m.content)
            .ok_or(LlmError::MissingContent(BACKEND_NAME))
    }
}
