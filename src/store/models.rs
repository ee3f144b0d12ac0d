//! Catalog models for the graph store

use serde::{Deserialize, Serialize};

/// One result row as returned by the engine (column name -> value)
pub type Row = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableKind {
    Node,
    Rel,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Node => "NODE",
            TableKind::Rel => "REL",
        }
    }

    /// Parse a catalog `type` column, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NODE" => Some(TableKind::Node),
            "REL" | "RELATIONSHIP" => Some(TableKind::Rel),
            _ => None,
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry of the table listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub kind: TableKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
}

/// Per-table introspection result: ordered columns plus REL endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub properties: Vec<PropertyDefinition>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub kind: TableKind,
    pub properties: Vec<PropertyDefinition>,
    /// Source NODE table (REL only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Destination NODE table (REL only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl TableDefinition {
    pub fn from_parts(summary: TableSummary, description: TableDescription) -> Self {
        Self {
            name: summary.name,
            kind: summary.kind,
            properties: description.properties,
            from: description.from,
            to: description.to,
        }
    }

    pub fn primary_key(&self) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.is_primary_key)
    }

    /// Render as a `CREATE ... TABLE` statement (without terminator).
    pub fn to_ddl(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.kind == TableKind::Rel {
            parts.push(format!(
                "FROM {} TO {}",
                self.from.as_deref().unwrap_or("?"),
                self.to.as_deref().unwrap_or("?")
            ));
        }
        parts.extend(
            self.properties
                .iter()
                .map(|p| format!("{} {}", p.name, p.data_type)),
        );
        if self.kind == TableKind::Node {
            if let Some(pk) = self.primary_key() {
                parts.push(format!("PRIMARY KEY ({})", pk.name));
            }
        }
        format!(
            "CREATE {} TABLE {}({})",
            self.kind,
            self.name,
            parts.join(", ")
        )
    }
}

/// Committed set of table definitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableDefinition>,
}

impl SchemaSnapshot {
    pub fn new(tables: Vec<TableDefinition>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn node_tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.iter().filter(|t| t.kind == TableKind::Node)
    }

    pub fn rel_tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.iter().filter(|t| t.kind == TableKind::Rel)
    }

    /// DDL text for every table, NODE tables first, one statement per line.
    pub fn to_ddl(&self) -> String {
        self.node_tables()
            .chain(self.rel_tables())
            .map(|t| format!("{};", t.to_ddl()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
