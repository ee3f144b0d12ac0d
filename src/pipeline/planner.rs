//! Schema diff planner for append imports
//!
//! Asks the LLM whether the document needs tables the store does not have,
//! and serializes rows already in the store so later stages can avoid
//! re-emitting them.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::{prompt, PipelineError};
use crate::llm::{ChatMessage, CompletionGateway, LlmConfig};
use crate::store::{SchemaSnapshot, StoreError, TransactionalExecutor};
use crate::validator::strip_fences;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Classification {
    new_tables_required: bool,
}

/// Parse a strict `{"new_tables_required": bool}` answer.
pub fn parse_classification(raw: &str) -> Result<bool, PipelineError> {
    let cleaned = strip_fences(raw);
    serde_json::from_str::<Classification>(&cleaned)
        .map(|c| c.new_tables_required)
        .map_err(|e| PipelineError::ClassificationParseError {
            raw: raw.to_string(),
            message: e.to_string(),
        })
}

pub struct SchemaDiffPlanner {
    gateway: Arc<CompletionGateway>,
    llm: LlmConfig,
}

impl SchemaDiffPlanner {
    pub fn new(gateway: Arc<CompletionGateway>, llm: LlmConfig) -> Self {
        Self { gateway, llm }
    }

    /// Whether `document` needs tables missing from `existing_schema`.
    ///
    /// An empty store always needs new tables; no completion is requested.
    pub async fn needs_new_tables(
        &self,
        existing_schema: &str,
        document: &str,
    ) -> Result<bool, PipelineError> {
        if existing_schema.trim().is_empty() {
            return Ok(true);
        }
        let messages = [
            ChatMessage::system(prompt::classification_system()),
            ChatMessage::user(prompt::classification_user(existing_schema, document)),
        ];
        let raw = self.gateway.complete(&self.llm, &messages).await?;
        let needed = parse_classification(&raw)?;
        tracing::info!(new_tables_required = needed, "Schema classification");
        Ok(needed)
    }
}

fn without_markers(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(k, _)| !k.starts_with('_'))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Up to `rows_per_table` rows of every NODE table, as JSON lines grouped by
/// table. `None` when the store holds no rows.
pub async fn existing_data_context(
    executor: &TransactionalExecutor,
    schema: &SchemaSnapshot,
    rows_per_table: usize,
) -> Result<Option<String>, StoreError> {
    if rows_per_table == 0 {
        return Ok(None);
    }

    let mut sections = Vec::new();
    for table in schema.node_tables() {
        let rows = executor
            .execute(&format!(
                "MATCH (n:{}) RETURN n LIMIT {}",
                table.name, rows_per_table
            ))
            .await?;
        if rows.is_empty() {
            continue;
        }
        let lines: Vec<String> = rows
            .iter()
            .filter_map(|row| row.get("n"))
            .map(|n| without_markers(n).to_string())
            .collect();
        sections.push(format!("// {}\n{}", table.name, lines.join("\n")));
    }

    if sections.is_empty() {
        Ok(None)
    } else {
        Ok(Some(sections.join("\n")))
    }
}
