//! Completion gateway
//!
//! One-shot chat completions against a configured LLM backend.
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `CompletionBackend` trait: async interface, one method per call
//! - `OpenAiCompatibleBackend`, `ClaudeBackend`, `GeminiBackend`: vendor adapters
//! - `CompletionGateway`: registry dispatching on the configured discriminator
//! - `MockCompletionBackend`: scripted responses for tests

pub mod anthropic;
pub mod gateway;
pub mod gemini;
pub mod openai;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use anthropic::ClaudeBackend;
pub use gateway::{CompletionGateway, LlmConfig, ProviderConfig};
pub use gemini::GeminiBackend;
pub use openai::{OpenAiCompatibleBackend, OpenAiFlavor};
pub use traits::{ChatMessage, CompletionBackend, GatewayError, Role};
