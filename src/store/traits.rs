//! GraphEngine trait definition
//!
//! The narrow execute/transaction/catalog surface the rest of the crate
//! consumes. Implemented by `KuzuHttpEngine` in production and by
//! `MockGraphEngine` in tests.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Row, TableDescription, TableSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The engine rejected a statement.
    #[error("Query execution failed: {message}")]
    Execution { message: String },

    /// Dropping or recreating the store failed.
    #[error("Database reset failed: {message}")]
    Reset { message: String },

    /// The engine could not be reached.
    #[error("Graph store unreachable at {url}: {message}")]
    Transport { url: String, message: String },

    /// The engine answered with something we cannot interpret.
    #[error("Unexpected response from graph store: {0}")]
    Protocol(String),

    #[error("Operation not supported by this engine: {0}")]
    Unsupported(&'static str),
}

impl StoreError {
    pub fn execution(message: impl Into<String>) -> Self {
        StoreError::Execution {
            message: message.into(),
        }
    }
}

/// Abstract interface for a property-graph engine.
///
/// One statement per call; `begin`/`commit`/`rollback` bracket a transaction
/// on the engine's single shared connection. Callers serialize batches.
#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Execute one statement and return its rows.
    async fn execute(&self, statement: &str) -> Result<Vec<Row>, StoreError>;

    async fn begin(&self) -> Result<(), StoreError>;

    async fn commit(&self) -> Result<(), StoreError>;

    async fn rollback(&self) -> Result<(), StoreError>;

    /// Enumerate every table in the catalog.
    async fn list_tables(&self) -> Result<Vec<TableSummary>, StoreError>;

    /// Ordered columns of one table, plus endpoints for REL tables.
    async fn describe_table(&self, table: &TableSummary) -> Result<TableDescription, StoreError>;

    /// Replace the store with an empty one.
    async fn recreate(&self) -> Result<(), StoreError>;
}
