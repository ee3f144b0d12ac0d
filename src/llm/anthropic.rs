//! Anthropic messages API backend
//!
//! The system prompt travels in a dedicated `system` field; only user and
//! assistant turns go into `messages`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::gateway::{ProviderConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use super::traits::{ChatMessage, CompletionBackend, GatewayError, Role};

const DEFAULT_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: String,
    messages: Vec<&'a ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Clone)]
pub struct ClaudeBackend {
    client: reqwest::Client,
}

impl ClaudeBackend {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Concatenate every system turn; the API accepts a single system string.
fn system_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl CompletionBackend for ClaudeBackend {
    async fn complete(
        &self,
        config: &ProviderConfig,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let url = config.url.clone().unwrap_or_else(|| DEFAULT_URL.to_string());

        let body = MessagesRequest {
            model: &config.model,
            system: system_prompt(messages),
            messages: messages.iter().filter(|m| m.role != Role::System).collect(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", config.api_key.clone().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(GatewayError::Provider {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|_| GatewayError::empty_completion(text.clone()))?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| GatewayError::empty_completion(text))
    }

    fn name(&self) -> &str {
        "claude"
    }
}
