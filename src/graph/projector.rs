//! Result projector: raw query rows to a deduplicated graph model
//!
//! Walks an arbitrarily nested JSON result. Objects carrying `_id` and
//! `_label` are nodes; with `_src` and `_dst` as well they are edges.
//! Markers are stripped from the stored property bag.

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::models::{GraphEdge, GraphModel, GraphNode, RawId};

/// Color for elements without a label
pub const UNLABELED_COLOR: &str = "#a2a2a2";

const MARKERS: [&str; 4] = ["_id", "_label", "_src", "_dst"];

/// How a raw JSON value is interpreted during the walk
#[derive(Debug)]
pub enum ResultShape<'a> {
    Node(&'a Map<String, Value>),
    Edge(&'a Map<String, Value>),
    Collection(&'a [Value]),
    Scalar(&'a Value),
    /// Object without graph markers; its values are walked
    Opaque(&'a Map<String, Value>),
}

fn has_marker(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

pub fn classify(value: &Value) -> ResultShape<'_> {
    match value {
        Value::Array(items) => ResultShape::Collection(items),
        Value::Object(obj) => {
            let identified = obj.get("_id").and_then(RawId::from_value).is_some()
                && has_marker(obj, "_label");
            match (identified, has_marker(obj, "_src"), has_marker(obj, "_dst")) {
                (true, false, _) => ResultShape::Node(obj),
                (true, true, true) => ResultShape::Edge(obj),
                _ => ResultShape::Opaque(obj),
            }
        }
        other => ResultShape::Scalar(other),
    }
}

/// Deterministic `hsl(...)` color from a label's text.
pub fn label_color(label: Option<&str>) -> String {
    let Some(label) = label.filter(|l| !l.is_empty()) else {
        return UNLABELED_COLOR.to_string();
    };
    let mut hash: i32 = 0;
    for unit in label.encode_utf16() {
        hash = i32::from(unit).wrapping_add((hash << 5).wrapping_sub(hash));
    }
    format!("hsl({}, 70%, 50%)", hash.rem_euclid(360))
}

fn strip_markers(obj: &Map<String, Value>) -> Map<String, Value> {
    obj.iter()
        .filter(|(k, _)| !MARKERS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn label_of(obj: &Map<String, Value>) -> String {
    obj.get("_label")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[derive(Default)]
struct Projector {
    model: GraphModel,
    seen_nodes: HashSet<String>,
    seen_edges: HashSet<String>,
}

impl Projector {
    fn visit(&mut self, value: &Value) {
        match classify(value) {
            ResultShape::Node(obj) => self.add_node(obj),
            ResultShape::Edge(obj) => self.add_edge(obj),
            ResultShape::Collection(items) => items.iter().for_each(|v| self.visit(v)),
            ResultShape::Opaque(obj) => obj.values().for_each(|v| self.visit(v)),
            ResultShape::Scalar(_) => {}
        }
    }

    fn add_node(&mut self, obj: &Map<String, Value>) {
        let Some(raw_id) = obj.get("_id").and_then(RawId::from_value) else {
            return;
        };
        let id = raw_id.key();
        if !self.seen_nodes.insert(id.clone()) {
            return;
        }
        let label = label_of(obj);
        let properties = strip_markers(obj);
        let caption = properties
            .get("name")
            .and_then(display_text)
            .or_else(|| properties.get("title").and_then(display_text))
            .unwrap_or_else(|| label.clone());

        self.model.nodes.push(GraphNode {
            id,
            color: label_color(Some(label.as_str())),
            caption,
            label,
            properties,
            raw_id,
        });
    }

    fn add_edge(&mut self, obj: &Map<String, Value>) {
        let endpoint = |key: &str| obj.get(key).and_then(RawId::from_value);
        let (Some(raw_id), Some(src), Some(dst)) = (endpoint("_id"), endpoint("_src"), endpoint("_dst"))
        else {
            return;
        };
        let id = raw_id.key();
        if !self.seen_edges.insert(id.clone()) {
            return;
        }
        let label = label_of(obj);
        self.model.edges.push(GraphEdge {
            id,
            source_id: src.key(),
            target_id: dst.key(),
            color: label_color(Some(label.as_str())),
            label,
            properties: strip_markers(obj),
            raw_id,
        });
    }
}

/// Project a raw result into its node/edge model.
pub fn project(raw: &Value) -> GraphModel {
    let mut projector = Projector::default();
    projector.visit(raw);
    tracing::debug!(
        nodes = projector.model.nodes.len(),
        edges = projector.model.edges.len(),
        "Projected query result"
    );
    projector.model
}

/// Project rows as returned by the executor.
pub fn project_rows(rows: &[Value]) -> GraphModel {
    let mut projector = Projector::default();
    rows.iter().for_each(|row| projector.visit(row));
    projector.model
}
