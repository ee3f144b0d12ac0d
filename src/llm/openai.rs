//! OpenAI-compatible chat-completions backend
//!
//! Covers every provider speaking the `/v1/chat/completions` format:
//! - **LM Studio** (default): local server, no auth
//! - **OpenAI**: Bearer auth
//! - **Mistral**: Bearer auth, explicit `max_tokens`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::gateway::{ProviderConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use super::traits::{ChatMessage, CompletionBackend, GatewayError};

/// Which OpenAI-compatible vendor a backend instance talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiFlavor {
    LmStudio,
    OpenAi,
    Mistral,
}

impl OpenAiFlavor {
    pub fn name(&self) -> &'static str {
        match self {
            OpenAiFlavor::LmStudio => "lmstudio",
            OpenAiFlavor::OpenAi => "openai",
            OpenAiFlavor::Mistral => "mistral",
        }
    }

    fn default_url(&self) -> &'static str {
        match self {
            OpenAiFlavor::LmStudio => "http://localhost:1234/v1/chat/completions",
            OpenAiFlavor::OpenAi => "https://api.openai.com/v1/chat/completions",
            OpenAiFlavor::Mistral => "https://api.mistral.ai/v1/chat/completions",
        }
    }
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Backend for any OpenAI-compatible chat-completions endpoint.
///
/// Cheaply cloneable (shares the reqwest client internally).
#[derive(Clone)]
pub struct OpenAiCompatibleBackend {
    client: reqwest::Client,
    flavor: OpenAiFlavor,
}

impl OpenAiCompatibleBackend {
    pub fn new(client: reqwest::Client, flavor: OpenAiFlavor) -> Self {
        Self { client, flavor }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompatibleBackend {
    async fn complete(
        &self,
        config: &ProviderConfig,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| self.flavor.default_url().to_string());

        let body = CompletionRequest {
            model: &config.model,
            messages,
            temperature: DEFAULT_TEMPERATURE,
            stream: false,
            max_tokens: (self.flavor == OpenAiFlavor::Mistral).then_some(DEFAULT_MAX_TOKENS),
        };

        let mut req = self.client.post(&url).json(&body);
        if self.flavor != OpenAiFlavor::LmStudio {
            if let Some(ref key) = config.api_key {
                req = req.bearer_auth(key);
            }
        }

        let response = req.send().await.map_err(|e| GatewayError::Transport {
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

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|_| GatewayError::empty_completion(text.clone()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| GatewayError::empty_completion(text))
    }

    fn name(&self) -> &str {
        self.flavor.name()
    }
}
