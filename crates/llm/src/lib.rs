//! Chat completion backends.
//!
//! A backend takes a system instruction and a user prompt and returns the
//! text of a single, non-streamed assistant message. Nothing here interprets
//! that text.
pub mod errors;
pub mod ollama;
pub mod openai;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use errors::{LlmError, Result};

#[async_trait]
pub trait CompletionBackend: Debug + Sync + Send {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Request a single completion and return the message content.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Connection settings shared by all backends.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Root url of the backend, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Timeout for the whole request. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl BackendConfig {
    /// Join an api path onto the configured base url.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        let root = Url::parse(self.base_url.trim_end_matches('/'))?;
        let joined = format!("{}/{}", root.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&joined)?)
    }

    pub(crate) fn client_builder(&self) -> reqwest::ClientBuilder {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

/// Check the status and decode the body of a backend response.
///
/// The body is read as text first so that it can be reported when the status
/// or the payload is not what was expected.
pub(crate) async fn read_response<T: DeserializeOwned>(
    backend: &'static str,
    resp: reqwest::Response,
) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(LlmError::UnexpectedStatus {
            backend,
            status,
            body,
        });
    }
    match serde_json::from_str(&body) {
        Ok(decoded) => Ok(decoded),
        Err(source) => Err(LlmError::InvalidResponse {
            backend,
            source,
            body,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> BackendConfig {
        BackendConfig {
            base_url: base_url.to_string(),
            model: "llama3".to_string(),
            timeout: None,
        }
    }

    #[test]
    fn endpoint_joins_path() {
        let url = config("http://localhost:11434").endpoint("api/chat").unwrap();
        assert_eq!("http://localhost:11434/api/chat", url.as_str());
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let url = config("https://proxy.internal/llm/")
            .endpoint("v1/chat/completions")
            .unwrap();
        assert_eq!("https://proxy.internal/llm/v1/chat/completions", url.as_str());
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert!(config("not a url").endpoint("api/chat").is_err());
    }

    #[test]
    fn message_roles() {
        assert_eq!("system", Message::system("a").role);
        assert_eq!("user", Message::user("b").role);
    }
}
