//! Statements editing or deleting a single rendered element

use serde_json::{Map, Value};

use super::models::{GraphElement, GraphNode};

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Literal preserving the value's JSON type.
pub fn value_literal(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Literal for a user-edited value: numeric strings are written unquoted.
pub fn edited_literal(value: &Value) -> String {
    match value {
        Value::String(s) if !s.trim().is_empty() && s.trim().parse::<f64>().is_ok() => {
            s.trim().to_string()
        }
        other => value_literal(other),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn property_map(props: &Map<String, Value>) -> String {
    let entries: Vec<String> = props
        .iter()
        .map(|(k, v)| format!("{}: {}", k, value_literal(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// `MATCH ... SET` for every changed, non-key property of `node`.
///
/// A property counts as changed when its textual form differs. Returns
/// `None` when nothing changed or the node lacks its primary key.
pub fn update_statement(
    node: &GraphNode,
    primary_key: &str,
    changes: &Map<String, Value>,
) -> Option<String> {
    let key_value = node.properties.get(primary_key)?;

    let assignments: Vec<String> = changes
        .iter()
        .filter(|(k, _)| k.as_str() != primary_key)
        .filter(|(k, v)| {
            node.properties
                .get(k.as_str())
                .map_or(true, |current| as_text(current) != as_text(v))
        })
        .map(|(k, v)| format!("item.{} = {}", k, edited_literal(v)))
        .collect();

    if assignments.is_empty() {
        return None;
    }
    Some(format!(
        "MATCH (item:{} {{{}: {}}}) SET {}",
        node.label,
        primary_key,
        value_literal(key_value),
        assignments.join(", ")
    ))
}

/// Delete statement for one element.
///
/// Nodes are matched on their primary key and detached; edges on their
/// primary key when given, else on their full property bag. Returns `None`
/// when the element cannot be identified.
pub fn delete_statement(element: &GraphElement, primary_key: Option<&str>) -> Option<String> {
    match element {
        GraphElement::Node(node) => {
            let pk = primary_key?;
            let value = node.properties.get(pk)?;
            Some(format!(
                "MATCH (item:{} {{{}: {}}}) DETACH DELETE item",
                node.label,
                pk,
                value_literal(value)
            ))
        }
        GraphElement::Edge(edge) => {
            let filter = match primary_key.and_then(|pk| edge.properties.get(pk).map(|v| (pk, v))) {
                Some((pk, v)) => format!("{{{}: {}}}", pk, value_literal(v)),
                None if !edge.properties.is_empty() => property_map(&edge.properties),
                None => return None,
            };
            Some(format!(
                "MATCH ()-[item:{} {}]->() DELETE item",
                edge.label, filter
            ))
        }
    }
}
