//! CompletionBackend trait definition
//!
//! Defines the abstract interface for one-shot chat completions.
//! Same shape as `GraphEngine`: async trait + Send + Sync so backends can be
//! shared as `Arc<dyn CompletionBackend>` inside the gateway registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::gateway::ProviderConfig;

/// Role of a message in a chat conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Errors raised by the completion gateway and its backends.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend answered with a non-success status (or an unusable body).
    #[error("LLM provider responded with status {status}: {body}")]
    Provider { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error("LLM provider unreachable at {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Unsupported AI provider: {0}")]
    UnsupportedProvider(String),

    #[error("No configuration section for AI provider '{0}'")]
    MissingProviderConfig(String),
}

impl GatewayError {
    /// Build a provider error for a 2xx response that carried no completion.
    pub fn empty_completion(body: impl Into<String>) -> Self {
        GatewayError::Provider {
            status: 200,
            body: body.into(),
        }
    }
}

/// Abstract interface for a chat-completion backend.
///
/// Each implementation adapts the role-tagged message list to its vendor wire
/// shape and extracts exactly one textual completion.
///
/// # Implementations
///
/// - [`OpenAiCompatibleBackend`](super::OpenAiCompatibleBackend): LM Studio,
///   OpenAI and Mistral (`/v1/chat/completions` format)
/// - [`ClaudeBackend`](super::ClaudeBackend): Anthropic messages API
/// - [`GeminiBackend`](super::GeminiBackend): Google `generateContent`
/// - `MockCompletionBackend`: scripted responses for tests
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the conversation and return the assistant's text.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Provider`] on any non-success status or when
    /// the response holds no completion text. Never retries.
    async fn complete(
        &self,
        config: &ProviderConfig,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError>;

    /// Discriminator this backend is registered under (e.g. `"mistral"`).
    fn name(&self) -> &str;
}
