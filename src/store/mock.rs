//! In-memory mock implementation of GraphEngine for testing.
//!
//! Interprets the statement subset the pipeline emits (table DDL, node
//! MERGE/CREATE with inline property maps, MATCH...MERGE relationships,
//! simple reads, SET and DELETE by property map). Transactions snapshot the
//! whole state. Failure injection flags cover catalog, rollback and
//! recreate. Conditionally compiled with `#[cfg(test)]`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use super::models::{PropertyDefinition, Row, TableDescription, TableKind, TableSummary};
use super::traits::{GraphEngine, StoreError};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static CREATE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?is)^CREATE\s+(NODE|REL)\s+TABLE\s+(\w+)\s*\((.*)\)$"));
static DROP_TABLE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^DROP\s+TABLE\s+(\w+)$"));
static FROM_TO: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)^FROM\s+(\w+)\s+TO\s+(\w+)$"));
static PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)^PRIMARY\s+KEY\s*\(\s*(\w+)\s*\)$"));
static NODE_WRITE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?is)^(MERGE|CREATE)\s*\(\s*\w*\s*:\s*(\w+)\s*(\{.*\})?\s*\)$"));
static REL_WRITE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?is)^(MATCH\b.*?)\b(MERGE|CREATE)\s*\(\s*(\w+)\s*\)\s*-\s*\[\s*\w*\s*:\s*(\w+)\s*(\{[^}]*\})?\s*\]\s*->\s*\(\s*(\w+)\s*\)$")
});
static NODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| re(r"\(\s*(\w+)\s*:\s*(\w+)\s*(\{[^}]*\})?\s*\)"));
static ALL_WITH_EDGES: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)^MATCH\s*\(\s*(\w+)\s*\)\s*OPTIONAL\s+MATCH\s*\(\s*\w+\s*\)\s*-\s*\[\s*(\w+)\s*\]\s*->\s*\(\s*\)\s*RETURN\s+\w+\s*,\s*\w+$")
});
static MATCH_RETURN: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)^MATCH\s*\(\s*(\w+)\s*(?::\s*(\w+))?\s*\)\s*RETURN\s+\w+(?:\s+LIMIT\s+(\d+))?$")
});
static NODE_SET: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?is)^MATCH\s*\(\s*\w+\s*:\s*(\w+)\s*(\{[^}]*\})?\s*\)\s*SET\s+(.+)$")
});
static NODE_DELETE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)^MATCH\s*\(\s*\w+\s*:\s*(\w+)\s*(\{[^}]*\})?\s*\)\s*DETACH\s+DELETE\s+\w+$")
});
static REL_DELETE: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)^MATCH\s*\(\s*\)\s*-\s*\[\s*\w+\s*:\s*(\w+)\s*(\{[^}]*\})?\s*\]\s*->\s*\(\s*\)\s*DELETE\s+\w+$")
});
static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| re(r"(?s)^\w+\.(\w+)\s*=\s*(.+)$"));

#[derive(Debug, Clone)]
struct MockTable {
    id: u64,
    name: String,
    kind: TableKind,
    properties: Vec<PropertyDefinition>,
    from: Option<String>,
    to: Option<String>,
    next_offset: u64,
}

impl MockTable {
    fn has_column(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    fn serial_column(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.data_type.eq_ignore_ascii_case("SERIAL"))
            .map(|p| p.name.as_str())
    }
}

type NodeKey = (String, u64);

#[derive(Debug, Clone)]
struct MockNode {
    table: String,
    offset: u64,
    props: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct MockRel {
    table: String,
    offset: u64,
    src: NodeKey,
    dst: NodeKey,
    props: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
struct State {
    tables: Vec<MockTable>,
    nodes: Vec<MockNode>,
    rels: Vec<MockRel>,
    next_table_id: u64,
}

fn binder(message: impl std::fmt::Display) -> StoreError {
    StoreError::execution(format!("Binder exception: {}", message))
}

impl State {
    fn table(&self, name: &str) -> Result<&MockTable, StoreError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| binder(format!("Table {} does not exist.", name)))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MockTable, StoreError> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| binder(format!("Table {} does not exist.", name)))
    }

    fn table_id(&self, name: &str) -> u64 {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .map_or(0, |t| t.id)
    }

    fn check_columns(&self, table: &str, props: &Map<String, Value>) -> Result<(), StoreError> {
        let t = self.table(table)?;
        match props.keys().find(|k| !t.has_column(k)) {
            Some(missing) => Err(binder(format!(
                "Cannot find property {} for table {}.",
                missing, table
            ))),
            None => Ok(()),
        }
    }

    fn matching_nodes(&self, table: &str, filter: &Map<String, Value>) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter(|n| n.table == table && contains_all(&n.props, filter))
            .map(|n| (n.table.clone(), n.offset))
            .collect()
    }

    fn node_json(&self, node: &MockNode) -> Value {
        let mut obj = node.props.clone();
        obj.insert(
            "_id".into(),
            json!({"table": self.table_id(&node.table), "offset": node.offset}),
        );
        obj.insert("_label".into(), Value::String(node.table.clone()));
        Value::Object(obj)
    }

    fn rel_json(&self, rel: &MockRel) -> Value {
        let mut obj = rel.props.clone();
        obj.insert(
            "_id".into(),
            json!({"table": self.table_id(&rel.table), "offset": rel.offset}),
        );
        obj.insert("_label".into(), Value::String(rel.table.clone()));
        obj.insert(
            "_src".into(),
            json!({"table": self.table_id(&rel.src.0), "offset": rel.src.1}),
        );
        obj.insert(
            "_dst".into(),
            json!({"table": self.table_id(&rel.dst.0), "offset": rel.dst.1}),
        );
        Value::Object(obj)
    }

    fn next_offset(&mut self, table: &str) -> Result<u64, StoreError> {
        let t = self.table_mut(table)?;
        let offset = t.next_offset;
        t.next_offset += 1;
        Ok(offset)
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn create_table(&mut self, kind: &str, name: &str, body: &str) -> Result<(), StoreError> {
        if self.tables.iter().any(|t| t.name == name) {
            return Err(binder(format!("{} already exists in catalog.", name)));
        }
        let kind = TableKind::parse(kind).ok_or_else(|| binder("unknown table kind"))?;
        let mut table = MockTable {
            id: self.next_table_id,
            name: name.to_string(),
            kind,
            properties: Vec::new(),
            from: None,
            to: None,
            next_offset: 0,
        };

        let mut primary_key = None;
        for part in split_top_level(body, ',') {
            if let Some(caps) = FROM_TO.captures(&part) {
                for endpoint in [&caps[1], &caps[2]] {
                    if self.table(endpoint)?.kind != TableKind::Node {
                        return Err(binder(format!("{} is not a node table.", endpoint)));
                    }
                }
                table.from = Some(caps[1].to_string());
                table.to = Some(caps[2].to_string());
            } else if let Some(caps) = PRIMARY_KEY.captures(&part) {
                primary_key = Some(caps[1].to_string());
            } else {
                let mut words = part.split_whitespace();
                let (Some(col), Some(data_type)) = (words.next(), words.next()) else {
                    return Err(StoreError::execution(format!(
                        "Parser exception: invalid column definition '{}'",
                        part
                    )));
                };
                table.properties.push(PropertyDefinition {
                    name: col.to_string(),
                    data_type: data_type.to_uppercase(),
                    is_primary_key: false,
                });
            }
        }

        match (kind, primary_key) {
            (TableKind::Node, Some(pk)) => {
                let col = table
                    .properties
                    .iter_mut()
                    .find(|p| p.name == pk)
                    .ok_or_else(|| binder(format!("Primary key {} is not a column.", pk)))?;
                col.is_primary_key = true;
            }
            (TableKind::Node, None) => {
                return Err(binder(format!("Node table {} has no primary key.", name)))
            }
            (TableKind::Rel, _) if table.from.is_none() => {
                return Err(binder(format!("Rel table {} has no FROM/TO.", name)))
            }
            (TableKind::Rel, _) => {}
        }

        self.next_table_id += 1;
        self.tables.push(table);
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<(), StoreError> {
        let kind = self.table(name)?.kind;
        if kind == TableKind::Node {
            if let Some(rel) = self.tables.iter().find(|t| {
                t.from.as_deref() == Some(name) || t.to.as_deref() == Some(name)
            }) {
                return Err(binder(format!(
                    "Cannot delete node table {} because it is referenced by relationship table {}.",
                    name, rel.name
                )));
            }
        }
        self.tables.retain(|t| t.name != name);
        self.nodes.retain(|n| n.table != name);
        self.rels.retain(|r| r.table != name);
        Ok(())
    }

    fn write_node(&mut self, verb: &str, label: &str, props: Map<String, Value>) -> Result<(), StoreError> {
        if self.table(label)?.kind != TableKind::Node {
            return Err(binder(format!("{} is not a node table.", label)));
        }
        self.check_columns(label, &props)?;

        if verb.eq_ignore_ascii_case("MERGE") && !self.matching_nodes(label, &props).is_empty() {
            return Ok(());
        }

        let serial = self.table(label)?.serial_column().map(String::from);
        let offset = self.next_offset(label)?;
        let mut props = props;
        if let Some(col) = serial {
            props.entry(col).or_insert(json!(offset));
        }
        self.nodes.push(MockNode {
            table: label.to_string(),
            offset,
            props,
        });
        Ok(())
    }

    fn write_rel(&mut self, caps: &regex::Captures<'_>) -> Result<(), StoreError> {
        let prefix = &caps[1];
        let verb = &caps[2];
        let (src_var, rel_table, dst_var) = (&caps[3], &caps[4], &caps[6]);
        let rel_props = caps.get(5).map_or(Ok(Map::new()), |m| parse_map(m.as_str()))?;

        let mut bindings: Vec<(String, String, Vec<NodeKey>)> = Vec::new();
        for pattern in NODE_PATTERN.captures_iter(prefix) {
            let label = &pattern[2];
            self.table(label)?;
            let filter = pattern
                .get(3)
                .map_or(Ok(Map::new()), |m| parse_map(m.as_str()))?;
            self.check_columns(label, &filter)?;
            bindings.push((
                pattern[1].to_string(),
                label.to_string(),
                self.matching_nodes(label, &filter),
            ));
        }

        let lookup = |var: &str| {
            bindings
                .iter()
                .find(|(v, _, _)| v == var)
                .ok_or_else(|| binder(format!("Variable {} is not in scope.", var)))
        };
        let (_, src_label, sources) = lookup(src_var)?;
        let (_, dst_label, targets) = lookup(dst_var)?;

        let rel = self.table(rel_table)?;
        if rel.kind != TableKind::Rel {
            return Err(binder(format!("{} is not a rel table.", rel_table)));
        }
        if rel.from.as_deref() != Some(src_label.as_str()) || rel.to.as_deref() != Some(dst_label.as_str()) {
            return Err(binder(format!(
                "Query node {} violates schema. Expected labels are {}.",
                src_var,
                rel.from.as_deref().unwrap_or("?")
            )));
        }
        self.check_columns(rel_table, &rel_props)?;

        let (sources, targets) = (sources.clone(), targets.clone());
        for src in &sources {
            for dst in &targets {
                let exists = self.rels.iter().any(|r| {
                    r.table == rel_table
                        && &r.src == src
                        && &r.dst == dst
                        && contains_all(&r.props, &rel_props)
                });
                if exists && verb.eq_ignore_ascii_case("MERGE") {
                    continue;
                }
                let offset = self.next_offset(rel_table)?;
                self.rels.push(MockRel {
                    table: rel_table.to_string(),
                    offset,
                    src: src.clone(),
                    dst: dst.clone(),
                    props: rel_props.clone(),
                });
            }
        }
        Ok(())
    }

    fn set_properties(&mut self, label: &str, filter: &Map<String, Value>, assignments: &str) -> Result<(), StoreError> {
        let mut updates = Map::new();
        for part in split_top_level(assignments, ',') {
            let caps = ASSIGNMENT
                .captures(&part)
                .ok_or_else(|| StoreError::execution(format!("Parser exception: {}", part)))?;
            updates.insert(caps[1].to_string(), parse_literal(&caps[2])?);
        }
        self.check_columns(label, &updates)?;
        for node in self
            .nodes
            .iter_mut()
            .filter(|n| n.table == label && contains_all(&n.props, filter))
        {
            for (k, v) in &updates {
                node.props.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }

    fn detach_delete(&mut self, label: &str, filter: &Map<String, Value>) -> Result<(), StoreError> {
        self.table(label)?;
        let doomed = self.matching_nodes(label, filter);
        self.nodes
            .retain(|n| !doomed.contains(&(n.table.clone(), n.offset)));
        self.rels
            .retain(|r| !doomed.contains(&r.src) && !doomed.contains(&r.dst));
        Ok(())
    }

    fn delete_rels(&mut self, table: &str, filter: &Map<String, Value>) -> Result<(), StoreError> {
        self.table(table)?;
        self.rels
            .retain(|r| !(r.table == table && contains_all(&r.props, filter)));
        Ok(())
    }

    fn rows_all_with_edges(&self, node_var: &str, rel_var: &str) -> Vec<Row> {
        let mut rows = Vec::new();
        for node in &self.nodes {
            let key = (node.table.clone(), node.offset);
            let outgoing: Vec<&MockRel> = self.rels.iter().filter(|r| r.src == key).collect();
            if outgoing.is_empty() {
                rows.push(json!({ node_var: self.node_json(node), rel_var: Value::Null }));
            }
            for rel in outgoing {
                rows.push(json!({ node_var: self.node_json(node), rel_var: self.rel_json(rel) }));
            }
        }
        rows
    }

    fn rows_match_return(&self, var: &str, label: Option<&str>, limit: Option<usize>) -> Result<Vec<Row>, StoreError> {
        if let Some(label) = label {
            self.table(label)?;
        }
        Ok(self
            .nodes
            .iter()
            .filter(|n| label.map_or(true, |l| n.table == l))
            .take(limit.unwrap_or(usize::MAX))
            .map(|n| json!({ var: self.node_json(n) }))
            .collect())
    }

    fn run(&mut self, stmt: &str) -> Result<Vec<Row>, StoreError> {
        let stmt = stmt.trim().trim_end_matches(';').trim();

        if let Some(caps) = CREATE_TABLE.captures(stmt) {
            self.create_table(&caps[1], &caps[2], &caps[3])?;
            return Ok(Vec::new());
        }
        if let Some(caps) = DROP_TABLE.captures(stmt) {
            self.drop_table(&caps[1])?;
            return Ok(Vec::new());
        }
        if let Some(caps) = NODE_WRITE.captures(stmt) {
            let props = caps.get(3).map_or(Ok(Map::new()), |m| parse_map(m.as_str()))?;
            self.write_node(&caps[1], &caps[2], props)?;
            return Ok(Vec::new());
        }
        if let Some(caps) = REL_WRITE.captures(stmt) {
            self.write_rel(&caps)?;
            return Ok(Vec::new());
        }
        if let Some(caps) = ALL_WITH_EDGES.captures(stmt) {
            return Ok(self.rows_all_with_edges(&caps[1], &caps[2]));
        }
        if let Some(caps) = MATCH_RETURN.captures(stmt) {
            let limit = caps.get(3).and_then(|m| m.as_str().parse().ok());
            return self.rows_match_return(&caps[1], caps.get(2).map(|m| m.as_str()), limit);
        }
        if let Some(caps) = NODE_SET.captures(stmt) {
            let filter = caps.get(2).map_or(Ok(Map::new()), |m| parse_map(m.as_str()))?;
            self.set_properties(&caps[1], &filter, &caps[3])?;
            return Ok(Vec::new());
        }
        if let Some(caps) = NODE_DELETE.captures(stmt) {
            let filter = caps.get(2).map_or(Ok(Map::new()), |m| parse_map(m.as_str()))?;
            self.detach_delete(&caps[1], &filter)?;
            return Ok(Vec::new());
        }
        if let Some(caps) = REL_DELETE.captures(stmt) {
            let filter = caps.get(2).map_or(Ok(Map::new()), |m| parse_map(m.as_str()))?;
            self.delete_rels(&caps[1], &filter)?;
            return Ok(Vec::new());
        }
        Err(StoreError::execution(format!(
            "Parser exception: unsupported statement '{}'",
            stmt
        )))
    }
}

fn contains_all(props: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(k, v)| props.get(k) == Some(v))
}

/// Split on `sep` outside quotes and brackets.
fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', Some(_)) => escaped = true,
            ('\'' | '"', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            ('(' | '[' | '{', None) => depth += 1,
            (')' | ']' | '}', None) => depth -= 1,
            (c, None) if c == sep && depth == 0 => {
                let part = current.trim().to_string();
                if !part.is_empty() {
                    parts.push(part);
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    let part = current.trim().to_string();
    if !part.is_empty() {
        parts.push(part);
    }
    parts
}

fn parse_literal(raw: &str) -> Result<Value, StoreError> {
    let s = raw.trim();
    let quoted = s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')));
    if quoted {
        let mut out = String::new();
        let mut chars = s[1..s.len() - 1].chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        return Ok(Value::String(out));
    }
    match s.to_ascii_lowercase().as_str() {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" => return Ok(Value::Null),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return Ok(json!(i));
    }
    if let Ok(f) = s.parse::<f64>() {
        return Ok(json!(f));
    }
    Err(StoreError::execution(format!(
        "Parser exception: invalid literal '{}'",
        s
    )))
}

/// Parse an inline `{key: value, ...}` property map.
fn parse_map(text: &str) -> Result<Map<String, Value>, StoreError> {
    let inner = text
        .trim()
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .ok_or_else(|| StoreError::execution(format!("Parser exception: bad map '{}'", text)))?;
    let mut map = Map::new();
    for entry in split_top_level(inner, ',') {
        let (key, value) = entry
            .split_once(':')
            .ok_or_else(|| StoreError::execution(format!("Parser exception: bad entry '{}'", entry)))?;
        map.insert(key.trim().trim_matches('`').to_string(), parse_literal(value)?);
    }
    Ok(map)
}

pub struct MockGraphEngine {
    state: Mutex<State>,
    /// State captured at BEGIN, restored on ROLLBACK
    snapshot: Mutex<Option<State>>,
    log: Mutex<Vec<String>>,
    catalog_reads: AtomicUsize,
    fail_catalog: AtomicBool,
    fail_rollback: AtomicBool,
    fail_recreate: AtomicBool,
}

impl Default for MockGraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGraphEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            snapshot: Mutex::new(None),
            log: Mutex::new(Vec::new()),
            catalog_reads: AtomicUsize::new(0),
            fail_catalog: AtomicBool::new(false),
            fail_rollback: AtomicBool::new(false),
            fail_recreate: AtomicBool::new(false),
        }
    }

    /// Every statement received, including transaction control.
    pub async fn statement_log(&self) -> Vec<String> {
        self.log.lock().await.clone()
    }

    pub fn catalog_reads(&self) -> usize {
        self.catalog_reads.load(Ordering::SeqCst)
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    pub fn fail_rollback(&self, fail: bool) {
        self.fail_rollback.store(fail, Ordering::SeqCst);
    }

    pub fn fail_recreate(&self, fail: bool) {
        self.fail_recreate.store(fail, Ordering::SeqCst);
    }

    pub async fn node_count(&self) -> usize {
        self.state.lock().await.nodes.len()
    }

    pub async fn rel_count(&self) -> usize {
        self.state.lock().await.rels.len()
    }

    fn catalog_guard(&self) -> Result<(), StoreError> {
        self.catalog_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(StoreError::execution("Catalog unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl GraphEngine for MockGraphEngine {
    async fn execute(&self, statement: &str) -> Result<Vec<Row>, StoreError> {
        self.log.lock().await.push(statement.to_string());
        self.state.lock().await.run(statement)
    }

    async fn begin(&self) -> Result<(), StoreError> {
        self.log.lock().await.push("BEGIN TRANSACTION".into());
        let mut snapshot = self.snapshot.lock().await;
        if snapshot.is_some() {
            return Err(StoreError::execution(
                "Connection already has an active transaction.",
            ));
        }
        *snapshot = Some(self.state.lock().await.clone());
        Ok(())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        self.log.lock().await.push("COMMIT".into());
        self.snapshot.lock().await.take();
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        self.log.lock().await.push("ROLLBACK".into());
        let saved = self.snapshot.lock().await.take();
        if self.fail_rollback.load(Ordering::SeqCst) {
            return Err(StoreError::execution("Rollback failed"));
        }
        if let Some(saved) = saved {
            *self.state.lock().await = saved;
        }
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<TableSummary>, StoreError> {
        self.catalog_guard()?;
        Ok(self
            .state
            .lock()
            .await
            .tables
            .iter()
            .map(|t| TableSummary {
                name: t.name.clone(),
                kind: t.kind,
            })
            .collect())
    }

    async fn describe_table(&self, table: &TableSummary) -> Result<TableDescription, StoreError> {
        self.catalog_guard()?;
        let state = self.state.lock().await;
        let t = state.table(&table.name)?;
        Ok(TableDescription {
            properties: t.properties.clone(),
            from: t.from.clone(),
            to: t.to.clone(),
        })
    }

    async fn recreate(&self) -> Result<(), StoreError> {
        if self.fail_recreate.load(Ordering::SeqCst) {
            return Err(StoreError::Reset {
                message: "Cannot remove database directory".into(),
            });
        }
        *self.state.lock().await = State::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn people() -> MockGraphEngine {
        let engine = MockGraphEngine::new();
        for stmt in [
            "CREATE NODE TABLE Person(id SERIAL, name STRING, age INT64, PRIMARY KEY (id))",
            "CREATE REL TABLE Knows(FROM Person TO Person, since INT64)",
            "MERGE (a:Person {name: 'Alice', age: 30})",
            "MERGE (b:Person {name: 'Bob'})",
        ] {
            engine.execute(stmt).await.unwrap();
        }
        engine
    }

    #[test]
    fn test_parse_map() {
        let map = parse_map(r"{name: 'O\'Brien', age: 42, ok: true, score: 1.5}").unwrap();
        assert_eq!(map["name"], "O'Brien");
        assert_eq!(map["age"], 42);
        assert_eq!(map["ok"], true);
        assert_eq!(map["score"], 1.5);
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let engine = people().await;
        engine.execute("MERGE (a:Person {name: 'Bob'})").await.unwrap();
        assert_eq!(engine.node_count().await, 2);
        engine.execute("CREATE (a:Person {name: 'Bob'})").await.unwrap();
        assert_eq!(engine.node_count().await, 3);
    }

    #[tokio::test]
    async fn test_relationship_merge_and_read_back() {
        let engine = people().await;
        engine
            .execute("MATCH (a:Person {name: 'Alice'}), (b:Person {name: 'Bob'}) MERGE (a)-[:Knows {since: 2020}]->(b)")
            .await
            .unwrap();
        assert_eq!(engine.rel_count().await, 1);

        let rows = engine
            .execute("MATCH (n) OPTIONAL MATCH (n)-[r]->() RETURN n, r")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["r"]["_label"], "Knows");
        assert_eq!(rows[0]["r"]["since"], 2020);
        assert!(rows[1]["r"].is_null());
        assert_eq!(rows[0]["n"]["id"], 0);
    }

    #[tokio::test]
    async fn test_unknown_table_and_column_fail() {
        let engine = people().await;
        assert!(engine.execute("MERGE (g:Ghost {name: 'x'})").await.is_err());
        assert!(engine.execute("MERGE (p:Person {email: 'x'})").await.is_err());
    }

    #[tokio::test]
    async fn test_drop_referenced_node_table_fails() {
        let engine = people().await;
        assert!(engine.execute("DROP TABLE Person").await.is_err());
        engine.execute("DROP TABLE Knows").await.unwrap();
        engine.execute("DROP TABLE Person").await.unwrap();
        assert!(engine.list_tables().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_and_delete() {
        let engine = people().await;
        engine
            .execute("MATCH (item:Person {name: 'Bob'}) SET item.age = 25")
            .await
            .unwrap();
        let rows = engine
            .execute("MATCH (n:Person) RETURN n LIMIT 5")
            .await
            .unwrap();
        assert_eq!(rows[1]["n"]["age"], 25);

        engine
            .execute("MATCH (item:Person {name: 'Bob'}) DETACH DELETE item")
            .await
            .unwrap();
        assert_eq!(engine.node_count().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_restores_state() {
        let engine = people().await;
        engine.begin().await.unwrap();
        engine.execute("MERGE (c:Person {name: 'Carol'})").await.unwrap();
        engine.rollback().await.unwrap();
        assert_eq!(engine.node_count().await, 2);
    }
}
