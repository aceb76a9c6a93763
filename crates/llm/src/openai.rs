//! Client for OpenAI-compatible chat completion apis.
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::errors::{LlmError, Result};
use crate::{BackendConfig, CompletionBackend, Message, read_response};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

const BACKEND_NAME: &str = "openai";

#[derive(Debug, Serialize, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    // Note omitting response_format. Json object mode forces a single object
    // which would drop every stage but one.
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
    pub id: Option<String>,
    pub object: Option<String>,
    pub model: Option<String>,
    pub created: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: Message,
    pub index: usize,
    pub finish_reason: Option<String>,
    // Note logprobs omitted.
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    completions_url: Url,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &BackendConfig, api_key: &str) -> Result<OpenAiClient> {
        let mut def_headers = HeaderMap::new();
        def_headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))?,
        );
        def_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = config
            .client_builder()
            .default_headers(def_headers)
            .build()?;

        Ok(OpenAiClient {
            client,
            completions_url: config.endpoint("v1/chat/completions")?,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let req = CompletionRequest {
            model: &self.model,
            messages: vec![Message::system(system), Message::user(prompt)],
            temperature: Some(0.0),
        };

        debug!(url = %self.completions_url, model = %self.model, "sending completion request");

        let resp = self
            .client
            .post(self.completions_url.clone())
            .json(&req)
            .send()
            .await?;

        let resp: CompletionResponse = read_response(BACKEND_NAME, resp).await?;
        resp.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::MissingContent(BACKEND_NAME))
    }
}
