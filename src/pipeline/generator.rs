//! Generation-retry orchestrator
//!
//! Each stage runs Prompting → Validating → {Accepted | Retrying | Exhausted}.
//! A rejected attempt is appended to the conversation as an assistant turn,
//! followed by a corrective user turn naming the rejection reason. Provider
//! errors abort the stage immediately and are never retried.

use std::sync::Arc;

use serde::Serialize;

use super::prompt;
use super::{ImportMode, PipelineError, Stage};
use crate::llm::{ChatMessage, CompletionGateway, LlmConfig};
use crate::validator::{is_effectively_empty, normalize, normalize_schema, validate, Verdict};

/// Attempts per stage, first try included
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// One LLM round within a stage
#[derive(Debug, Clone, Serialize)]
pub struct GenerationAttempt {
    pub stage: Stage,
    /// 1-based
    pub number: usize,
    pub messages: Vec<ChatMessage>,
    pub raw: String,
    pub cleaned: String,
    pub verdict: Verdict,
}

/// Result of a stage
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    /// Accepted text, or the last attempt when a permissive stage exhausted
    pub text: String,
    pub accepted: bool,
    pub attempts: Vec<GenerationAttempt>,
}

impl StageOutcome {
    pub fn warnings(&self) -> impl Iterator<Item = &String> {
        self.attempts.iter().flat_map(|a| a.verdict.warnings.iter())
    }
}

pub struct Generator {
    gateway: Arc<CompletionGateway>,
    llm: LlmConfig,
    max_attempts: usize,
}

impl Generator {
    pub fn new(gateway: Arc<CompletionGateway>, llm: LlmConfig) -> Self {
        Self {
            gateway,
            llm,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Generate DDL for the tables the document needs.
    ///
    /// An empty or comment-only answer is accepted at once as "no new schema".
    pub async fn generate_schema(
        &self,
        document: &str,
        mode: ImportMode,
        existing_schema: Option<&str>,
    ) -> Result<StageOutcome, PipelineError> {
        let messages = vec![
            ChatMessage::system(prompt::schema_system(mode)),
            ChatMessage::user(prompt::schema_user(document, existing_schema)),
        ];
        self.run_stage(Stage::Schema, messages).await
    }

    pub async fn generate_nodes(
        &self,
        document: &str,
        schema: &str,
        existing_data: Option<&str>,
    ) -> Result<StageOutcome, PipelineError> {
        let messages = vec![
            ChatMessage::system(prompt::nodes_system()),
            ChatMessage::user(prompt::nodes_user(document, schema, existing_data)),
        ];
        self.run_stage(Stage::Nodes, messages).await
    }

    pub async fn generate_relationships(
        &self,
        document: &str,
        schema: &str,
        node_statements: &str,
        existing_data: Option<&str>,
    ) -> Result<StageOutcome, PipelineError> {
        let messages = vec![
            ChatMessage::system(prompt::relationships_system()),
            ChatMessage::user(prompt::relationships_user(
                document,
                schema,
                node_statements,
                existing_data,
            )),
        ];
        self.run_stage(Stage::Relationships, messages).await
    }

    /// Two-stage flavour: nodes and relationships in one data batch.
    pub async fn generate_data(
        &self,
        document: &str,
        schema: &str,
    ) -> Result<StageOutcome, PipelineError> {
        let messages = vec![
            ChatMessage::system(prompt::data_system()),
            ChatMessage::user(prompt::data_user(document, schema)),
        ];
        self.run_stage(Stage::Data, messages).await
    }

    async fn run_stage(
        &self,
        stage: Stage,
        mut conversation: Vec<ChatMessage>,
    ) -> Result<StageOutcome, PipelineError> {
        let mut attempts: Vec<GenerationAttempt> = Vec::new();

        for number in 1..=self.max_attempts {
            tracing::debug!(%stage, attempt = number, "Prompting");
            let raw = self.gateway.complete(&self.llm, &conversation).await?;

            if stage == Stage::Schema && is_effectively_empty(&raw) {
                tracing::info!(%stage, attempt = number, "No new schema required");
                attempts.push(GenerationAttempt {
                    stage,
                    number,
                    messages: conversation,
                    raw,
                    cleaned: String::new(),
                    verdict: Verdict::accepted(),
                });
                return Ok(StageOutcome {
                    stage,
                    text: String::new(),
                    accepted: true,
                    attempts,
                });
            }

            let cleaned = match stage {
                Stage::Schema => normalize_schema(&raw),
                _ => normalize(&raw),
            };
            let verdict = validate(stage.kind(), &cleaned);
            attempts.push(GenerationAttempt {
                stage,
                number,
                messages: conversation.clone(),
                raw: raw.clone(),
                cleaned: cleaned.clone(),
                verdict: verdict.clone(),
            });

            if verdict.valid {
                for warning in &verdict.warnings {
                    tracing::warn!(%stage, attempt = number, %warning, "Validation warning");
                }
                tracing::info!(%stage, attempt = number, "Stage accepted");
                return Ok(StageOutcome {
                    stage,
                    text: cleaned,
                    accepted: true,
                    attempts,
                });
            }

            let reason = verdict.reason.unwrap_or_default();
            tracing::warn!(%stage, attempt = number, %reason, "Attempt rejected");
            if number < self.max_attempts {
                conversation.push(ChatMessage::assistant(raw));
                conversation.push(ChatMessage::user(prompt::corrective(&reason)));
            }
        }

        let last = attempts.last().cloned();
        let reason = last
            .as_ref()
            .and_then(|a| a.verdict.reason.clone())
            .unwrap_or_default();

        if stage.is_strict() {
            tracing::warn!(%stage, attempts = attempts.len(), "Stage exhausted");
            return Err(PipelineError::ValidationFailure {
                stage,
                attempts: attempts.len(),
                reason,
            });
        }

        tracing::warn!(%stage, attempts = attempts.len(), %reason, "Stage exhausted, returning last attempt for review");
        Ok(StageOutcome {
            stage,
            text: last.map(|a| a.cleaned).unwrap_or_default(),
            accepted: false,
            attempts,
        })
    }
}
