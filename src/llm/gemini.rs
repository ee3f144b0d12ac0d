//! Google Gemini `generateContent` backend

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::gateway::{ProviderConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use super::traits::{ChatMessage, CompletionBackend, GatewayError, Role};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Gemini has no system role: system turns are sent as user turns.
fn to_contents(messages: &[ChatMessage]) -> Vec<Content> {
    messages
        .iter()
        .map(|m| Content {
            role: match m.role {
                Role::System | Role::User => "user",
                Role::Assistant => "model",
            },
            parts: vec![Part {
                text: m.content.clone(),
            }],
        })
        .collect()
}

/// The response shape varies across API versions; accept the known ones.
fn extract_text(body: &Value) -> Option<String> {
    let candidate = body.get("candidates")?.get(0)?;
    candidate
        .pointer("/content/parts/0/text")
        .or_else(|| candidate.get("output"))
        .or_else(|| candidate.get("text"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    async fn complete(
        &self,
        config: &ProviderConfig,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let base = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let url = format!("{}/{}:generateContent", base.trim_end_matches('/'), config.model);

        let body = GenerateRequest {
            contents: to_contents(messages),
            generation_config: GenerationConfig {
                temperature: DEFAULT_TEMPERATURE,
                max_output_tokens: DEFAULT_MAX_TOKENS,
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", config.api_key.clone().unwrap_or_default())])
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

        serde_json::from_str::<Value>(&text)
            .ok()
            .as_ref()
            .and_then(extract_text)
            .ok_or_else(|| GatewayError::empty_completion(text))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
