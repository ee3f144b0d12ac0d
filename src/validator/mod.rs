//! Statement validation for LLM-generated graph statements
//!
//! Purely structural checks, one rule table per generation stage. Validation
//! cannot know whether referenced tables exist; semantic failures surface
//! later, when the store executes the batch.
//!
//! - [`normalize`] - fence stripping, statement splitting, DDL reordering
//! - [`rules`] - ordered `(predicate, reason)` tables
//! - [`heuristic`] - "does this text look like a query?" scoring

pub mod heuristic;
pub mod normalize;
pub mod rules;

use serde::Serialize;

pub use heuristic::looks_like_query;
pub use normalize::{
    is_effectively_empty, normalize, normalize_schema, split_statements, strip_fences,
};

use rules::Rule;

/// Which generation stage a text is validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Schema,
    Node,
    Relationship,
    GenericData,
}

impl StatementKind {
    /// An empty schema means "no new tables"; every data kind needs output.
    pub fn allows_empty(&self) -> bool {
        matches!(self, StatementKind::Schema)
    }

    fn text_rules(&self) -> &'static [Rule] {
        match self {
            StatementKind::Schema => rules::SCHEMA_TEXT_RULES,
            _ => &[],
        }
    }

    fn statement_rules(&self) -> &'static [Rule] {
        match self {
            StatementKind::Schema => rules::SCHEMA_STATEMENT_RULES,
            StatementKind::Node => rules::NODE_STATEMENT_RULES,
            StatementKind::Relationship => rules::RELATIONSHIP_STATEMENT_RULES,
            StatementKind::GenericData => rules::DATA_STATEMENT_RULES,
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatementKind::Schema => "schema",
            StatementKind::Node => "node",
            StatementKind::Relationship => "relationship",
            StatementKind::GenericData => "data",
        };
        f.write_str(s)
    }
}

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub valid: bool,
    pub reason: Option<String>,
    /// Soft findings that do not reject the text
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Verdict {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            reason: None,
            warnings: Vec::new(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            warnings: Vec::new(),
        }
    }
}

/// Shorten a statement for inclusion in a rejection reason.
fn excerpt(stmt: &str) -> String {
    const MAX: usize = 120;
    let flat = stmt.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        format!("{}...", flat.chars().take(MAX).collect::<String>())
    }
}

/// Validate `text` for the given stage; the first failing rule's reason wins.
pub fn validate(kind: StatementKind, text: &str) -> Verdict {
    let text = text.trim();
    if text.is_empty() {
        return if kind.allows_empty() {
            Verdict::accepted()
        } else {
            Verdict::rejected(format!("{} output is empty", kind))
        };
    }

    if let Some(rule) = kind.text_rules().iter().find(|r| !r.passes(text)) {
        let token = rules::forbidden_legacy_token(text)
            .map(|t| format!(" (found '{}')", t))
            .unwrap_or_default();
        tracing::debug!(%kind, rule = rule.name, "Validation failed");
        return Verdict::rejected(format!("{}{}", rule.reason, token));
    }

    let statements = split_statements(text);
    if statements.is_empty() && !kind.allows_empty() {
        return Verdict::rejected(format!("{} output contains no statements", kind));
    }

    let mut verdict = Verdict::accepted();
    for stmt in &statements {
        if let Some(rule) = kind.statement_rules().iter().find(|r| !r.passes(stmt)) {
            tracing::debug!(%kind, rule = rule.name, statement = %excerpt(stmt), "Validation failed");
            return Verdict::rejected(format!("{}: `{}`", rule.reason, excerpt(stmt)));
        }

        if kind == StatementKind::Relationship && rules::bound_nodes_before_merge(stmt) < 2 {
            verdict.warnings.push(format!(
                "fewer than two endpoints bound by MATCH before MERGE: `{}`",
                excerpt(stmt)
            ));
        }
    }
    verdict
}
