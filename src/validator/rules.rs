//! Ordered rule tables, one per statement kind.
//!
//! A rule is a named predicate plus the reason reported when it fails.
//! Text rules run once on the whole batch; statement rules run on every
//! statement in order, and the first failure wins.

use std::sync::LazyLock;

use regex::Regex;

/// A single structural check
pub struct Rule {
    pub name: &'static str,
    pub reason: &'static str,
    /// Returns true when the input satisfies the rule
    pub check: fn(&str) -> bool,
}

impl Rule {
    pub fn passes(&self, input: &str) -> bool {
        (self.check)(input)
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static FORBIDDEN_LEGACY: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(varchar|text|char|decimal|numeric|float|references|foreign\s+key|constraint)\b")
});
static CREATE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)^CREATE\s+(NODE|REL)\s+TABLE\b"));
static CREATE_NODE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)^CREATE\s+NODE\s+TABLE\b"));
static CREATE_REL_TABLE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^CREATE\s+REL\s+TABLE\b"));
static SURROGATE_KEY: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bid\s+SERIAL\b"));
static PRIMARY_KEY_ID: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bPRIMARY\s+KEY\s*\(\s*id\s*\)"));
static ANY_PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(id\s+SERIAL|PRIMARY\s+KEY)\b"));
static FROM_TO: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bFROM\s+\w+\s+TO\s+\w+"));
static NODE_START: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^(MERGE|CREATE)\b"));
static REL_START: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)^(OPTIONAL\s+MATCH|MATCH|MERGE|CREATE)\b"));
static DATA_START: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)^(OPTIONAL\s+MATCH|MATCH|MERGE|CREATE|WITH|UNWIND)\b"));
static OUTGOING_PATTERN: LazyLock<Regex> = LazyLock::new(|| re(r"-\s*\[.*\]\s*->"));
static INCOMING_PATTERN: LazyLock<Regex> = LazyLock::new(|| re(r"<-\s*\[.*\]\s*-"));
static DDL: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\b(CREATE\s+(NODE|REL)\s+TABLE|DROP\s+TABLE|ALTER\s+TABLE)\b"));
static MATCH_KEYWORD: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)\bMATCH\b"));
static ARROW_MERGE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bMERGE\s*\([^)]*\)\s*<?-\s*\["));
static BOUND_NODE: LazyLock<Regex> = LazyLock::new(|| re(r"\(\s*\w+\s*:\s*\w+"));

pub fn has_relationship_pattern(stmt: &str) -> bool {
    OUTGOING_PATTERN.is_match(stmt) || INCOMING_PATTERN.is_match(stmt)
}

pub fn contains_ddl(stmt: &str) -> bool {
    DDL.is_match(stmt)
}

/// Byte offsets of the first MATCH and the first MERGE creating a relationship.
pub fn match_and_arrow_merge(stmt: &str) -> (Option<usize>, Option<usize>) {
    (
        MATCH_KEYWORD.find(stmt).map(|m| m.start()),
        ARROW_MERGE.find(stmt).map(|m| m.start()),
    )
}

/// Number of `(var:Label ...)` patterns bound before the relationship MERGE.
pub fn bound_nodes_before_merge(stmt: &str) -> usize {
    let end = ARROW_MERGE.find(stmt).map_or(stmt.len(), |m| m.start());
    let prefix = &stmt[..end];
    if !MATCH_KEYWORD.is_match(prefix) {
        return 0;
    }
    BOUND_NODE.find_iter(prefix).count()
}

pub fn forbidden_legacy_token(text: &str) -> Option<String> {
    FORBIDDEN_LEGACY.find(text).map(|m| m.as_str().to_string())
}

// ============================================================================
// Schema
// ============================================================================

pub static SCHEMA_TEXT_RULES: &[Rule] = &[Rule {
    name: "no_legacy_sql",
    reason: "schema uses SQL-only syntax (column types like VARCHAR/TEXT/FLOAT, REFERENCES, FOREIGN KEY or CONSTRAINT)",
    check: |text| !FORBIDDEN_LEGACY.is_match(text),
}];

pub static SCHEMA_STATEMENT_RULES: &[Rule] = &[
    Rule {
        name: "create_table_only",
        reason: "every schema statement must be CREATE NODE TABLE or CREATE REL TABLE",
        check: |stmt| CREATE_TABLE.is_match(stmt),
    },
    Rule {
        name: "node_surrogate_key",
        reason: "NODE TABLE must declare 'id SERIAL' and 'PRIMARY KEY (id)'",
        check: |stmt| {
            !CREATE_NODE_TABLE.is_match(stmt)
                || (SURROGATE_KEY.is_match(stmt) && PRIMARY_KEY_ID.is_match(stmt))
        },
    },
    Rule {
        name: "rel_endpoints",
        reason: "REL TABLE must declare its endpoints with 'FROM <Node> TO <Node>'",
        check: |stmt| !CREATE_REL_TABLE.is_match(stmt) || FROM_TO.is_match(stmt),
    },
    Rule {
        name: "rel_without_primary_key",
        reason: "REL TABLE must not declare 'id SERIAL' or a PRIMARY KEY",
        check: |stmt| !CREATE_REL_TABLE.is_match(stmt) || !ANY_PRIMARY_KEY.is_match(stmt),
    },
];

// ============================================================================
// Nodes
// ============================================================================

pub static NODE_STATEMENT_RULES: &[Rule] = &[
    Rule {
        name: "merge_or_create",
        reason: "node statements must start with MERGE or CREATE",
        check: |stmt| NODE_START.is_match(stmt),
    },
    Rule {
        name: "no_ddl",
        reason: "node statements must not create or drop tables",
        check: |stmt| !contains_ddl(stmt),
    },
    Rule {
        name: "no_relationship_pattern",
        reason: "node statements must not contain relationship patterns",
        check: |stmt| !has_relationship_pattern(stmt),
    },
];

// ============================================================================
// Relationships
// ============================================================================

pub static RELATIONSHIP_STATEMENT_RULES: &[Rule] = &[
    Rule {
        name: "match_or_merge",
        reason: "relationship statements must start with MATCH, MERGE or CREATE",
        check: |stmt| REL_START.is_match(stmt),
    },
    Rule {
        name: "no_ddl",
        reason: "relationship statements must not create or drop tables",
        check: |stmt| !contains_ddl(stmt),
    },
    Rule {
        name: "has_relationship_pattern",
        reason: "relationship statements must contain a relationship pattern",
        check: has_relationship_pattern,
    },
    Rule {
        name: "match_before_merge",
        reason: "MATCH must come before the MERGE that creates the relationship",
        check: |stmt| match match_and_arrow_merge(stmt) {
            (Some(m), Some(merge)) => m < merge,
            (None, Some(_)) => false,
            (_, None) => true,
        },
    },
];

// ============================================================================
// Generic data
// ============================================================================

pub static DATA_STATEMENT_RULES: &[Rule] = &[
    Rule {
        name: "data_keyword",
        reason: "data statements must start with MATCH, MERGE, CREATE, WITH or UNWIND",
        check: |stmt| DATA_START.is_match(stmt),
    },
    Rule {
        name: "no_ddl",
        reason: "data statements must not create or drop tables",
        check: |stmt| !contains_ddl(stmt),
    },
];
