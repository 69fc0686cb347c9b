//! Completion client for the hosted LLM API.
//!
//! The engine treats the model as an opaque completion function. An empty
//! response is "no correction" and callers fall back to the original text;
//! it is never an error.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::EngineError;

#[cfg(test)]
pub mod stub;

/// One unit of completion work.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Uniform interface over the external completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion, returning the raw text of the top choice.
    /// An empty string means the model produced no usable output.
    async fn complete(&self, request: CompletionRequest) -> Result<String, EngineError>;

    /// Whether a credential is configured.
    fn is_initialized(&self) -> bool;
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct HttpCompletionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpCompletionClient {
    /// Create a new client. A missing API key leaves the client
    /// uninitialized; every call then fails fast with `NotInitialized`.
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, EngineError> {
        let api_key = self.api_key.as_ref().ok_or(EngineError::NotInitialized)?;

        let body = ChatCompletionRequest {
            model: request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: request.user_prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Completion(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "completion endpoint returned an error");
            return Err(EngineError::Completion(format!(
                "completion endpoint returned {}: {}",
                status, text
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Completion(e.to_string()))?;

        // A missing choice or empty content is "no correction", not an error.
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default()
            .trim()
            .to_string();

        debug!(chars = text.len(), "completion received");
        Ok(text)
    }

    fn is_initialized(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let client = HttpCompletionClient::new("http://localhost:0", None);
        assert!(!client.is_initialized());

        let result = client
            .complete(CompletionRequest {
                model: "test-model".to_string(),
                system_prompt: "system".to_string(),
                user_prompt: "user".to_string(),
                max_tokens: 10,
                temperature: 0.1,
            })
            .await;
        assert_eq!(result, Err(EngineError::NotInitialized));
    }
}
