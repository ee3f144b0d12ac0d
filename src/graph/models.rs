//! Renderable graph model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Engine-internal identity of a node or relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawId {
    pub table: u64,
    pub offset: u64,
}

impl RawId {
    /// Parse an `{table, offset}` marker; numeric strings are accepted.
    pub fn from_value(value: &Value) -> Option<Self> {
        fn number(v: &Value) -> Option<u64> {
            v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        }
        Some(Self {
            table: number(value.get("table")?)?,
            offset: number(value.get("offset")?)?,
        })
    }

    /// Dedup key, `"{table}-{offset}"`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.table, self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    /// Display text: `name`, else `title`, else the label
    pub caption: String,
    pub color: String,
    pub properties: Map<String, Value>,
    pub raw_id: RawId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub label: String,
    pub color: String,
    pub properties: Map<String, Value>,
    pub raw_id: RawId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GraphElement {
    Node(GraphNode),
    Edge(GraphEdge),
}

impl GraphElement {
    pub fn id(&self) -> &str {
        match self {
            GraphElement::Node(n) => &n.id,
            GraphElement::Edge(e) => &e.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            GraphElement::Node(n) => &n.label,
            GraphElement::Edge(e) => &e.label,
        }
    }

    pub fn properties(&self) -> &Map<String, Value> {
        match self {
            GraphElement::Node(n) => &n.properties,
            GraphElement::Edge(e) => &e.properties,
        }
    }
}

/// Deduplicated nodes and edges, in first-encounter order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphModel {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Look up any element by id, nodes first.
    pub fn element(&self, id: &str) -> Option<GraphElement> {
        self.node(id)
            .cloned()
            .map(GraphElement::Node)
            .or_else(|| self.edge(id).cloned().map(GraphElement::Edge))
    }
}
