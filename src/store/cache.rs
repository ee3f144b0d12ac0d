//! Single-slot schema memo
//!
//! Holds the last catalog snapshot until a DDL-affecting commit invalidates
//! it. A rebuild interrogates the whole catalog and only swaps the slot once
//! every introspection call has resolved, so readers observe either the old
//! snapshot or the complete new one.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::models::{SchemaSnapshot, TableDefinition};
use super::traits::{GraphEngine, StoreError};

#[derive(Default)]
pub struct SchemaCache {
    slot: RwLock<Option<Arc<SchemaSnapshot>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached snapshot; the next read rebuilds it.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        if slot.take().is_some() {
            tracing::debug!("Schema cache invalidated");
        }
    }

    /// Current snapshot without touching the engine.
    pub async fn peek(&self) -> Option<Arc<SchemaSnapshot>> {
        self.slot.read().await.clone()
    }

    /// Cached snapshot, or a fresh one interrogated from `engine`.
    pub async fn get_or_rebuild(
        &self,
        engine: &dyn GraphEngine,
    ) -> Result<Arc<SchemaSnapshot>, StoreError> {
        if let Some(snapshot) = self.peek().await {
            return Ok(snapshot);
        }

        let snapshot = Arc::new(Self::interrogate(engine).await?);
        let mut slot = self.slot.write().await;
        // Another reader may have rebuilt while we were introspecting
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }
        *slot = Some(snapshot.clone());
        tracing::debug!(tables = snapshot.tables.len(), "Schema cache rebuilt");
        Ok(snapshot)
    }

    async fn interrogate(engine: &dyn GraphEngine) -> Result<SchemaSnapshot, StoreError> {
        let summaries = engine.list_tables().await?;
        let mut tables = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let description = engine.describe_table(&summary).await?;
            tables.push(TableDefinition::from_parts(summary, description));
        }
        Ok(SchemaSnapshot::new(tables))
    }
}
