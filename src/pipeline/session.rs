//! Import sessions
//!
//! An [`ImportSession`] holds everything one import produces: the mode, the
//! document, what the store already had, and the accepted output of every
//! stage. The [`Importer`] fills it stage by stage and commits it as a single
//! batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::generator::{Generator, StageOutcome};
use super::planner::{existing_data_context, SchemaDiffPlanner};
use super::{ImportMode, PipelineError, Stage};
use crate::graph::GraphView;
use crate::store::TransactionalExecutor;
use crate::validator::{normalize, split_statements, validate, Verdict};

/// Existing rows sampled per NODE table for append prompts
pub const DEFAULT_ROWS_PER_TABLE: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct ImportSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub mode: ImportMode,
    pub document: String,
    /// DDL of the store at session start; empty on overwrite
    pub existing_schema: String,
    pub existing_data: Option<String>,
    /// `None` until generated, or when append mode needed no new tables
    pub schema: Option<StageOutcome>,
    pub nodes: Option<StageOutcome>,
    pub relationships: Option<StageOutcome>,
}

impl ImportSession {
    pub fn new(mode: ImportMode, document: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            mode,
            document: document.into(),
            existing_schema: String::new(),
            existing_data: None,
            schema: None,
            nodes: None,
            relationships: None,
        }
    }

    /// DDL generated by this session
    pub fn new_schema(&self) -> &str {
        self.schema.as_ref().map(|s| s.text.as_str()).unwrap_or("")
    }

    /// Existing and new DDL together, as later stages see it
    pub fn full_schema(&self) -> String {
        join_blocks([self.existing_schema.as_str(), self.new_schema()])
    }

    /// Relationship statements that exhausted their retries and were kept
    /// for manual correction.
    pub fn needs_review(&self) -> bool {
        self.relationships.as_ref().is_some_and(|r| !r.accepted)
    }

    /// Replace kept relationship statements with a manual correction. The
    /// text is normalized and accepted only if it validates.
    pub fn correct_relationships(&mut self, text: &str) -> Verdict {
        let text = normalize(text);
        let verdict = validate(Stage::Relationships.kind(), &text);
        if verdict.valid {
            let outcome = self.relationships.get_or_insert_with(|| StageOutcome {
                stage: Stage::Relationships,
                text: String::new(),
                accepted: false,
                attempts: Vec::new(),
            });
            outcome.text = text;
            outcome.accepted = true;
        }
        verdict
    }

    /// Everything to commit: new DDL, then nodes, then relationships.
    pub fn batch(&self) -> String {
        join_blocks([
            self.new_schema(),
            self.nodes.as_ref().map(|s| s.text.as_str()).unwrap_or(""),
            self.relationships
                .as_ref()
                .map(|s| s.text.as_str())
                .unwrap_or(""),
        ])
    }

    pub fn attempt_count(&self) -> usize {
        [&self.schema, &self.nodes, &self.relationships]
            .into_iter()
            .flatten()
            .map(|s| s.attempts.len())
            .sum()
    }
}

fn join_blocks<'a>(blocks: impl IntoIterator<Item = &'a str>) -> String {
    blocks
        .into_iter()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of a committed import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub statements: usize,
    pub nodes: usize,
    pub edges: usize,
}

pub struct Importer {
    generator: Generator,
    planner: SchemaDiffPlanner,
    executor: Arc<TransactionalExecutor>,
    rows_per_table: usize,
}

impl Importer {
    pub fn new(
        generator: Generator,
        planner: SchemaDiffPlanner,
        executor: Arc<TransactionalExecutor>,
    ) -> Self {
        Self {
            generator,
            planner,
            executor,
            rows_per_table: DEFAULT_ROWS_PER_TABLE,
        }
    }

    pub fn with_rows_per_table(mut self, rows_per_table: usize) -> Self {
        self.rows_per_table = rows_per_table;
        self
    }

    pub fn executor(&self) -> &Arc<TransactionalExecutor> {
        &self.executor
    }

    /// Open a session. Append mode snapshots the store's schema and a sample
    /// of its rows.
    pub async fn start(
        &self,
        mode: ImportMode,
        document: &str,
    ) -> Result<ImportSession, PipelineError> {
        if document.trim().is_empty() {
            return Err(PipelineError::EmptyDocument);
        }
        let mut session = ImportSession::new(mode, document.trim());

        if mode == ImportMode::Append {
            let schema = self.executor.get_schema().await?;
            session.existing_schema = schema.to_ddl();
            session.existing_data =
                existing_data_context(&self.executor, &schema, self.rows_per_table).await?;
            tracing::debug!(
                session = %session.id,
                tables = schema.tables.len(),
                has_data = session.existing_data.is_some(),
                "Append session opened"
            );
        }
        Ok(session)
    }

    /// Run schema, node and relationship generation in order.
    pub async fn generate(&self, session: &mut ImportSession) -> Result<(), PipelineError> {
        let document = session.document.clone();

        session.schema = match session.mode {
            ImportMode::Overwrite => Some(
                self.generator
                    .generate_schema(&document, ImportMode::Overwrite, None)
                    .await?,
            ),
            ImportMode::Append => {
                if self
                    .planner
                    .needs_new_tables(&session.existing_schema, &document)
                    .await?
                {
                    Some(
                        self.generator
                            .generate_schema(
                                &document,
                                ImportMode::Append,
                                Some(session.existing_schema.as_str()),
                            )
                            .await?,
                    )
                } else {
                    tracing::info!("Existing schema covers the document");
                    None
                }
            }
        };

        let schema = session.full_schema();
        let existing_data = session.existing_data.clone();

        let nodes = self
            .generator
            .generate_nodes(&document, &schema, existing_data.as_deref())
            .await?;
        let relationships = self
            .generator
            .generate_relationships(&document, &schema, &nodes.text, existing_data.as_deref())
            .await?;
        session.nodes = Some(nodes);
        session.relationships = Some(relationships);

        if session.needs_review() {
            tracing::warn!("Relationship statements kept for review after exhausting retries");
        }
        Ok(())
    }

    /// Commit the session's statements in one transaction and refresh `view`.
    /// Overwrite mode resets the store first.
    ///
    /// Refuses sessions whose relationship statements still need review; see
    /// [`ImportSession::correct_relationships`] and [`Importer::commit_unreviewed`].
    pub async fn commit(
        &self,
        session: &ImportSession,
        view: &mut GraphView,
    ) -> Result<ImportReport, PipelineError> {
        if session.needs_review() {
            let reason = session
                .relationships
                .as_ref()
                .and_then(|r| r.attempts.last())
                .and_then(|a| a.verdict.reason.clone())
                .unwrap_or_default();
            return Err(PipelineError::UnreviewedRelationships { reason });
        }
        self.commit_batch(session, view).await
    }

    /// Commit even when relationship statements were rejected by validation.
    pub async fn commit_unreviewed(
        &self,
        session: &ImportSession,
        view: &mut GraphView,
    ) -> Result<ImportReport, PipelineError> {
        if session.needs_review() {
            tracing::warn!(session = %session.id, "Committing unreviewed relationship statements");
        }
        self.commit_batch(session, view).await
    }

    async fn commit_batch(
        &self,
        session: &ImportSession,
        view: &mut GraphView,
    ) -> Result<ImportReport, PipelineError> {
        if session.mode == ImportMode::Overwrite {
            self.executor.reset().await?;
        }

        let batch = session.batch();
        let statements = split_statements(&batch).len();
        self.executor.execute(&batch).await?;
        tracing::info!(
            session = %session.id,
            mode = %session.mode,
            statements,
            elapsed_ms = (Utc::now() - session.started_at).num_milliseconds(),
            "Import committed"
        );

        let model = view.refresh(&self.executor).await?;
        Ok(ImportReport {
            statements,
            nodes: model.nodes.len(),
            edges: model.edges.len(),
        })
    }

    /// Start, generate and commit in one call. Fails with
    /// [`PipelineError::UnreviewedRelationships`] before touching the store when
    /// the relationship stage exhausted its retries.
    pub async fn run(
        &self,
        mode: ImportMode,
        document: &str,
        view: &mut GraphView,
    ) -> Result<(ImportSession, ImportReport), PipelineError> {
        let mut session = self.start(mode, document).await?;
        self.generate(&mut session).await?;
        let report = self.commit(&session, view).await?;
        Ok((session, report))
    }
}
