//! Stage prompts
//!
//! System instructions per generation stage, the task turns that carry the
//! document and schema context, and the corrective turn sent after a
//! rejected attempt.

use super::ImportMode;

const SCHEMA_SYSTEM: &str = "You are an expert Kuzu database designer. Based on the document you are given, design a property-graph schema.
Respond ONLY with Kuzu Cypher DDL statements (CREATE NODE TABLE / CREATE REL TABLE), each terminated by a semicolon. No prose, no comments.
Rules:
- Every NODE table MUST declare a property 'id SERIAL' and 'PRIMARY KEY (id)'.
- REL tables MUST declare their endpoints with 'FROM <NodeTable> TO <NodeTable>' and MUST NOT declare 'id SERIAL' nor any PRIMARY KEY.
- Use Kuzu types only: STRING, INT64, INT32, DOUBLE, BOOLEAN, DATE, TIMESTAMP. Never VARCHAR, TEXT, CHAR, DECIMAL, NUMERIC or FLOAT.
- Never use REFERENCES, FOREIGN KEY or CONSTRAINT.
Example:
CREATE NODE TABLE Person(id SERIAL, name STRING, age INT64, PRIMARY KEY (id));
CREATE REL TABLE Knows(FROM Person TO Person, since INT64);";

const APPEND_SCHEMA_NOTE: &str = "The database already contains the schema below. Emit ONLY the tables that are missing; never re-create an existing table. If nothing is missing, respond with an empty answer.";

const NODES_SYSTEM: &str = "You are a Kuzu data entry specialist. You are given a document and a Kuzu schema.
Extract every entity of the document and write one statement per entity that creates the node, according to the schema.
Respond ONLY with Cypher statements, each terminated by a semicolon.
Rules:
- Use MERGE on a unique property (such as name or title) to avoid duplicates; use CREATE only when no such property exists.
- Never set the 'id' property; it is generated.
- Do NOT create relationships: no '-[...]->' or '<-[...]-' patterns.
- Strings in single quotes, numbers as is.
Example:
MERGE (p:Person {name: 'Alice', age: 30});";

const RELATIONSHIPS_SYSTEM: &str = "You are a Kuzu data entry specialist. You are given a document, a Kuzu schema and the statements that created the nodes.
Write one statement per relationship described in the document.
Respond ONLY with Cypher statements, each terminated by a semicolon.
Rules:
- First MATCH both endpoint nodes by the same unique property used to create them, THEN MERGE the relationship between the bound variables.
- Only use relationship tables declared in the schema, in their declared FROM/TO direction.
- Do NOT create nodes or tables.
Example:
MATCH (a:Person {name: 'Alice'}), (b:Person {name: 'Bob'}) MERGE (a)-[:Knows]->(b);";

const DATA_SYSTEM: &str = "You are a Kuzu data entry specialist. You are given a document and a Kuzu schema.
Extract all relevant information from the document and convert it into Kuzu Cypher statements populating the database according to the schema.
Respond ONLY with Cypher statements, each terminated by a semicolon.
- Use MERGE on a unique property (like name or title) for nodes to prevent duplicates. If no clear unique property exists, use CREATE.
- For relationships, MATCH the source and destination nodes and then MERGE the relationship between them.
- Never create or drop tables.
- Ensure all property values are correctly formatted (strings in quotes, numbers as is).";

const CLASSIFICATION_SYSTEM: &str = "You decide whether a document can be stored in an existing graph schema.
Answer ONLY with a JSON object of the exact form {\"new_tables_required\": true} or {\"new_tables_required\": false}.
Answer true when the document describes kinds of entities or relationships that no existing table can hold.";

const EXISTING_DATA_NOTE: &str = "The database already contains the entries below. Do NOT emit statements for entities or relationships that are already present.";

pub fn schema_system(mode: ImportMode) -> String {
    match mode {
        ImportMode::Overwrite => SCHEMA_SYSTEM.to_string(),
        ImportMode::Append => format!("{}\n{}", SCHEMA_SYSTEM, APPEND_SCHEMA_NOTE),
    }
}

pub fn schema_user(document: &str, existing_schema: Option<&str>) -> String {
    match existing_schema.filter(|s| !s.trim().is_empty()) {
        Some(existing) => format!(
            "EXISTING SCHEMA:\n```cypher\n{}\n```\n\nDOCUMENT:\n---\n{}\n---",
            existing.trim(),
            document
        ),
        None => format!("Here is the document:\n\n---\n\n{}", document),
    }
}

fn existing_data_block(existing_data: Option<&str>) -> String {
    match existing_data.filter(|d| !d.trim().is_empty()) {
        Some(data) => format!("\n\n{}\nEXISTING DATA:\n{}", EXISTING_DATA_NOTE, data.trim()),
        None => String::new(),
    }
}

pub fn nodes_system() -> &'static str {
    NODES_SYSTEM
}

pub fn nodes_user(document: &str, schema: &str, existing_data: Option<&str>) -> String {
    format!(
        "SCHEMA:\n```cypher\n{}\n```\n\nDOCUMENT:\n---\n{}\n---{}\n\nNow generate the statements creating the nodes.",
        schema.trim(),
        document,
        existing_data_block(existing_data)
    )
}

pub fn relationships_system() -> &'static str {
    RELATIONSHIPS_SYSTEM
}

pub fn relationships_user(
    document: &str,
    schema: &str,
    node_statements: &str,
    existing_data: Option<&str>,
) -> String {
    format!(
        "SCHEMA:\n```cypher\n{}\n```\n\nNODE STATEMENTS:\n```cypher\n{}\n```\n\nDOCUMENT:\n---\n{}\n---{}\n\nNow generate the statements creating the relationships.",
        schema.trim(),
        node_statements.trim(),
        document,
        existing_data_block(existing_data)
    )
}

pub fn data_system() -> &'static str {
    DATA_SYSTEM
}

pub fn data_user(document: &str, schema: &str) -> String {
    format!(
        "SCHEMA:\n```cypher\n{}\n```\n\nDOCUMENT:\n---\n{}\n---\n\nNow, generate the Cypher queries to create the nodes and relationships described in the document.",
        schema.trim(),
        document
    )
}

pub fn classification_system() -> &'static str {
    CLASSIFICATION_SYSTEM
}

pub fn classification_user(existing_schema: &str, document: &str) -> String {
    format!(
        "EXISTING SCHEMA:\n```cypher\n{}\n```\n\nDOCUMENT:\n---\n{}\n---",
        existing_schema.trim(),
        document
    )
}

/// User turn sent after a rejected attempt.
pub fn corrective(reason: &str) -> String {
    format!(
        "Your previous answer was rejected: {}.\nFix it and answer again with the complete corrected statements only, following every rule.",
        reason.trim_end_matches('.')
    )
}
