//! Kuzu API server client
//!
//! Speaks the HTTP interface of a Kuzu API server: every statement is a
//! `POST /cypher` with `{query, params}`, answered by `{rows, dataTypes,
//! isSchemaChanged}` or an `{error}` body. Catalog reads go through Kuzu's
//! `CALL show_tables()`, `table_info()` and `show_connection()` functions.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::models::{PropertyDefinition, Row, TableDescription, TableKind, TableSummary};
use super::traits::{GraphEngine, StoreError};

#[derive(Debug, Serialize)]
struct CypherRequest<'a> {
    query: &'a str,
    params: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CypherResponse {
    #[serde(default)]
    rows: Vec<Row>,
    #[serde(default)]
    error: Option<String>,
}

/// Graph engine backed by a Kuzu API server.
///
/// The HTTP client is built on first use and shared by every later call.
pub struct KuzuHttpEngine {
    base_url: String,
    timeout: Duration,
    client: OnceLock<reqwest::Client>,
}

impl KuzuHttpEngine {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client: OnceLock::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> Result<&reqwest::Client, StoreError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| StoreError::Transport {
                url: self.base_url.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(url = %self.base_url, "Opened graph store connection");
        Ok(self.client.get_or_init(|| client))
    }

    async fn cypher(&self, query: &str) -> Result<Vec<Row>, StoreError> {
        let url = format!("{}/cypher", self.base_url);
        let body = CypherRequest {
            query,
            params: serde_json::Map::new(),
        };

        let response = self
            .client()?
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let parsed: Option<CypherResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = parsed
                .and_then(|p| p.error)
                .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), text));
            return Err(StoreError::execution(message));
        }

        match parsed {
            Some(CypherResponse {
                error: Some(message),
                ..
            }) => Err(StoreError::execution(message)),
            Some(resp) => Ok(resp.rows),
            None => Err(StoreError::Protocol(text)),
        }
    }
}

/// First string value among `keys` in a catalog row.
fn str_field(row: &Row, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| row.get(*k).and_then(Value::as_str))
        .map(String::from)
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub(crate) fn parse_table_list(rows: &[Row]) -> Result<Vec<TableSummary>, StoreError> {
    rows.iter()
        .map(|row| {
            let name = str_field(row, &["name"])
                .ok_or_else(|| StoreError::Protocol(format!("table row without name: {}", row)))?;
            let kind = str_field(row, &["type"])
                .and_then(|t| TableKind::parse(&t))
                .ok_or_else(|| StoreError::Protocol(format!("unknown table type: {}", row)))?;
            Ok(TableSummary { name, kind })
        })
        .collect()
}

pub(crate) fn parse_properties(rows: &[Row]) -> Vec<PropertyDefinition> {
    rows.iter()
        .filter_map(|row| {
            let name = str_field(row, &["name"])?;
            let data_type = str_field(row, &["type"]).unwrap_or_default();
            let is_primary_key = row
                .get("primary key")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Some(PropertyDefinition {
                name,
                data_type,
                is_primary_key,
            })
        })
        .collect()
}

#[async_trait]
impl GraphEngine for KuzuHttpEngine {
    async fn execute(&self, statement: &str) -> Result<Vec<Row>, StoreError> {
        self.cypher(statement).await
    }

    async fn begin(&self) -> Result<(), StoreError> {
        self.cypher("BEGIN TRANSACTION").await.map(|_| ())
    }

    async fn commit(&self) -> Result<(), StoreError> {
        self.cypher("COMMIT").await.map(|_| ())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        self.cypher("ROLLBACK").await.map(|_| ())
    }

    async fn list_tables(&self) -> Result<Vec<TableSummary>, StoreError> {
        let rows = self.cypher("CALL show_tables() RETURN *").await?;
        parse_table_list(&rows)
    }

    async fn describe_table(&self, table: &TableSummary) -> Result<TableDescription, StoreError> {
        let literal = quote_literal(&table.name);
        let rows = self
            .cypher(&format!("CALL table_info({}) RETURN *", literal))
            .await?;
        let mut description = TableDescription {
            properties: parse_properties(&rows),
            ..Default::default()
        };

        if table.kind == TableKind::Rel {
            let rows = self
                .cypher(&format!("CALL show_connection({}) RETURN *", literal))
                .await?;
            if let Some(row) = rows.first() {
                description.from = str_field(row, &["source table name", "from"]);
                description.to = str_field(row, &["destination table name", "to"]);
            }
        }
        Ok(description)
    }

    async fn recreate(&self) -> Result<(), StoreError> {
        // The API server owns its database directory
        Err(StoreError::Unsupported("recreate"))
    }
}
