//! Completion gateway: provider configuration and backend registry
//!
//! The gateway owns one backend per discriminator and dispatches each call to
//! the backend named by `LlmConfig::provider`. Callers never see a vendor wire
//! format.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::anthropic::ClaudeBackend;
use super::gemini::GeminiBackend;
use super::openai::{OpenAiCompatibleBackend, OpenAiFlavor};
use super::traits::{ChatMessage, CompletionBackend, GatewayError};

/// Sampling temperature shared by every backend.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Output cap for backends whose wire shape takes one.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Per-provider settings (one YAML sub-section per discriminator)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Endpoint override; each backend falls back to its vendor default
    pub url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
}

/// LLM section of the configuration.
///
/// ```yaml
/// llm:
///   provider: lmstudio
///   lmstudio:
///     url: http://localhost:1234/v1/chat/completions
///     model: mistralai/devstral-small-2507
///   mistral:
///     model: mistral-large-latest
///     api_key: sk-...
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Discriminator selecting the active backend
    pub provider: String,
    /// Provider sub-sections keyed by discriminator
    #[serde(flatten)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "lmstudio".to_string(),
            ProviderConfig {
                url: Some("http://localhost:1234/v1/chat/completions".to_string()),
                model: "mistralai/devstral-small-2507".to_string(),
                api_key: None,
            },
        );
        Self {
            provider: "lmstudio".to_string(),
            providers,
        }
    }
}

impl LlmConfig {
    /// Settings of the active provider.
    pub fn active(&self) -> Result<&ProviderConfig, GatewayError> {
        self.providers
            .get(&self.provider)
            .ok_or_else(|| GatewayError::MissingProviderConfig(self.provider.clone()))
    }

    /// Mutable settings of the active provider, created empty when absent.
    pub fn active_mut(&mut self) -> &mut ProviderConfig {
        self.providers.entry(self.provider.clone()).or_default()
    }
}

/// Registry of completion backends keyed by discriminator.
pub struct CompletionGateway {
    backends: HashMap<String, Arc<dyn CompletionBackend>>,
}

impl CompletionGateway {
    /// Empty registry (tests register their own backends).
    pub fn empty() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Registry with every built-in backend sharing one HTTP client.
    pub fn with_default_backends(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        let mut gateway = Self::empty();
        for flavor in [
            OpenAiFlavor::LmStudio,
            OpenAiFlavor::OpenAi,
            OpenAiFlavor::Mistral,
        ] {
            gateway.register(Arc::new(OpenAiCompatibleBackend::new(
                client.clone(),
                flavor,
            )));
        }
        gateway.register(Arc::new(ClaudeBackend::new(client.clone())));
        gateway.register(Arc::new(GeminiBackend::new(client)));
        gateway
    }

    /// Register (or replace) a backend under its own name.
    pub fn register(&mut self, backend: Arc<dyn CompletionBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn has_backend(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Dispatch to the backend selected by `config.provider`.
    pub async fn complete(
        &self,
        config: &LlmConfig,
        messages: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let backend = self
            .backends
            .get(&config.provider)
            .ok_or_else(|| GatewayError::UnsupportedProvider(config.provider.clone()))?;
        let provider_config = config.active()?;

        tracing::debug!(
            provider = %config.provider,
            model = %provider_config.model,
            messages = messages.len(),
            "Requesting completion"
        );
        backend.complete(provider_config, messages).await
    }
}
