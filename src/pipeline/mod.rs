//! Generation pipeline
//!
//! Turns a natural-language document into validated graph statements, stage
//! by stage, and commits them.
//!
//! ```text
//! document ──► SchemaDiffPlanner (append only)
//!                    │
//!              Generator: schema ──► nodes ──► relationships
//!                    │   (prompt → gateway → normalize → validate → retry)
//!                    ▼
//!              Importer: reset (overwrite) ──► one atomic commit ──► refresh
//! ```

pub mod generator;
pub mod planner;
pub mod prompt;
pub mod session;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::GatewayError;
use crate::store::StoreError;
use crate::validator::StatementKind;

pub use generator::{GenerationAttempt, Generator, StageOutcome};
pub use planner::{existing_data_context, parse_classification, SchemaDiffPlanner};
pub use session::{ImportReport, ImportSession, Importer};

/// Whether an import replaces the store or extends it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Drop everything, then import
    Overwrite,
    /// Keep existing tables and rows
    Append,
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportMode::Overwrite => f.write_str("overwrite"),
            ImportMode::Append => f.write_str("append"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Schema,
    Nodes,
    Relationships,
    Data,
}

impl Stage {
    pub fn kind(&self) -> StatementKind {
        match self {
            Stage::Schema => StatementKind::Schema,
            Stage::Nodes => StatementKind::Node,
            Stage::Relationships => StatementKind::Relationship,
            Stage::Data => StatementKind::GenericData,
        }
    }

    /// Strict stages fail the import on exhaustion; the others hand back
    /// their last attempt for manual correction.
    pub fn is_strict(&self) -> bool {
        !matches!(self, Stage::Relationships)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Schema => "schema",
            Stage::Nodes => "nodes",
            Stage::Relationships => "relationships",
            Stage::Data => "data",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] GatewayError),

    #[error("The {stage} stage produced no valid output after {attempts} attempts: {reason}")]
    ValidationFailure {
        stage: Stage,
        attempts: usize,
        reason: String,
    },

    #[error("Could not parse the schema classification ({message}): {raw}")]
    ClassificationParseError { raw: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("The document is empty")]
    EmptyDocument,

    #[error("Relationship statements failed validation and must be corrected before commit: {reason}")]
    UnreviewedRelationships { reason: String },
}
