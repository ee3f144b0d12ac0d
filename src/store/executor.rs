//! Transactional batch executor
//!
//! Commits validated batches all-or-nothing on the shared engine connection
//! and keeps the schema cache coherent with what was committed.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::Mutex;

use super::cache::SchemaCache;
use super::models::{Row, SchemaSnapshot, TableKind};
use super::traits::{GraphEngine, StoreError};
use crate::validator::split_statements;

static DDL_AFFECTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bcreate\b.*?\btable\b|\bdrop\s+table\b|\balter\s+table\b|\bdetach\s+delete\b")
        .expect("valid regex")
});

/// True when committed text may have changed the catalog.
pub fn affects_schema(batch: &str) -> bool {
    DDL_AFFECTING.is_match(batch)
}

pub struct TransactionalExecutor {
    engine: Arc<dyn GraphEngine>,
    cache: Arc<SchemaCache>,
    /// Serializes batches on the single shared connection
    batch_lock: Mutex<()>,
}

impl TransactionalExecutor {
    pub fn new(engine: Arc<dyn GraphEngine>) -> Self {
        Self::with_cache(engine, Arc::new(SchemaCache::new()))
    }

    pub fn with_cache(engine: Arc<dyn GraphEngine>, cache: Arc<SchemaCache>) -> Self {
        Self {
            engine,
            cache,
            batch_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    pub fn engine(&self) -> &Arc<dyn GraphEngine> {
        &self.engine
    }

    /// Execute a `;`-separated batch and return the last statement's rows.
    ///
    /// A single statement runs directly; several run inside one transaction
    /// that is rolled back on the first failure.
    pub async fn execute(&self, batch: &str) -> Result<Vec<Row>, StoreError> {
        let statements = split_statements(batch);
        if statements.is_empty() {
            return Ok(Vec::new());
        }

        let _guard = self.batch_lock.lock().await;
        let rows = if statements.len() == 1 {
            tracing::debug!(statement = %statements[0], "Executing statement");
            self.engine.execute(&statements[0]).await?
        } else {
            self.run_transaction(&statements).await?
        };

        if affects_schema(batch) {
            self.cache.invalidate().await;
        }
        Ok(rows)
    }

    async fn run_transaction(&self, statements: &[String]) -> Result<Vec<Row>, StoreError> {
        self.engine.begin().await?;
        tracing::debug!(statements = statements.len(), "Transaction started");

        let mut rows = Vec::new();
        for (i, stmt) in statements.iter().enumerate() {
            tracing::debug!(index = i, statement = %stmt, "Executing statement");
            match self.engine.execute(stmt).await {
                Ok(r) => rows = r,
                Err(e) => {
                    tracing::warn!(index = i, error = %e, "Statement failed, rolling back");
                    if let Err(rollback_err) = self.engine.rollback().await {
                        tracing::error!(error = %rollback_err, "Rollback failed");
                        self.invalidate_if_ddl(statements).await;
                    }
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.engine.commit().await {
            if let Err(rollback_err) = self.engine.rollback().await {
                tracing::error!(error = %rollback_err, "Rollback after failed commit failed");
                self.invalidate_if_ddl(statements).await;
            }
            return Err(e);
        }
        tracing::info!(statements = statements.len(), "Transaction committed");
        Ok(rows)
    }

    /// After a failed rollback the catalog state is unknown.
    async fn invalidate_if_ddl(&self, statements: &[String]) {
        if statements.iter().any(|s| affects_schema(s)) {
            self.cache.invalidate().await;
        }
    }

    /// Current schema, read through the cache.
    pub async fn get_schema(&self) -> Result<Arc<SchemaSnapshot>, StoreError> {
        self.cache.get_or_rebuild(self.engine.as_ref()).await
    }

    /// Drop every table (REL before NODE), falling back to recreating the
    /// store. The schema cache is invalidated whatever the outcome.
    pub async fn reset(&self) -> Result<(), StoreError> {
        let _guard = self.batch_lock.lock().await;
        let result = self.drop_all_tables().await;
        let result = match result {
            Ok(()) => Ok(()),
            Err(drop_err) => {
                tracing::warn!(error = %drop_err, "Dropping tables failed, recreating store");
                self.engine
                    .recreate()
                    .await
                    .map_err(|recreate_err| StoreError::Reset {
                        message: format!("{}; recreate: {}", drop_err, recreate_err),
                    })
            }
        };
        self.cache.invalidate().await;

        if result.is_ok() {
            tracing::info!("Graph store reset");
        }
        result
    }

    async fn drop_all_tables(&self) -> Result<(), StoreError> {
        let tables = self.engine.list_tables().await?;
        let ordered = tables
            .iter()
            .filter(|t| t.kind == TableKind::Rel)
            .chain(tables.iter().filter(|t| t.kind == TableKind::Node));
        for table in ordered {
            tracing::debug!(table = %table.name, kind = %table.kind, "Dropping table");
            self.engine
                .execute(&format!("DROP TABLE {}", table.name))
                .await?;
        }
        Ok(())
    }
}
