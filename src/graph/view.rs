//! Current rendered graph, replaced only after a confirmed commit

use super::models::GraphModel;
use super::projector::project_rows;
use crate::store::{StoreError, TransactionalExecutor};

/// Query re-run after every successful write
pub const REFRESH_QUERY: &str = "MATCH (n) OPTIONAL MATCH (n)-[r]->() RETURN n, r";

#[derive(Debug, Default)]
pub struct GraphView {
    model: GraphModel,
}

impl GraphView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// Run `query` and show its projection. On failure the previous model
    /// stays in place.
    pub async fn run(
        &mut self,
        executor: &TransactionalExecutor,
        query: &str,
    ) -> Result<&GraphModel, StoreError> {
        let rows = executor.execute(query).await?;
        self.model = project_rows(&rows);
        Ok(&self.model)
    }

    /// Re-read the whole graph.
    pub async fn refresh(
        &mut self,
        executor: &TransactionalExecutor,
    ) -> Result<&GraphModel, StoreError> {
        self.run(executor, REFRESH_QUERY).await
    }

    /// Commit a write, then refresh. A failed write leaves the model untouched.
    pub async fn apply_edit(
        &mut self,
        executor: &TransactionalExecutor,
        statement: &str,
    ) -> Result<&GraphModel, StoreError> {
        executor.execute(statement).await?;
        self.refresh(executor).await
    }
}
