//! LLM output normalization
//!
//! Turns a raw completion into a clean, `;`-terminated statement list.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*```[A-Za-z0-9_+-]*[ \t]*\r?\n?").expect("valid regex"));
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?```\s*$").expect("valid regex"));
static NODE_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^CREATE\s+NODE\s+TABLE\b").expect("valid regex"));

/// Remove one leading and one trailing markdown code fence.
pub fn strip_fences(raw: &str) -> String {
    let opened = FENCE_OPEN.replace(raw, "");
    FENCE_CLOSE.replace(&opened, "").trim().to_string()
}

fn is_comment_line(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("//") || line.starts_with("--")
}

/// Drop whole-line `//` and `--` comments.
pub fn strip_comment_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !is_comment_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a batch on `;`, ignoring semicolons inside quoted literals.
///
/// Statements are trimmed and empty ones dropped; terminators are not kept.
pub fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', Some(_)) => {
                current.push(c);
                escaped = true;
            }
            ('\'' | '"' | '`', None) => {
                quote = Some(c);
                current.push(c);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(c);
            }
            (';', None) => {
                push_trimmed(&mut statements, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_trimmed(&mut statements, &current);
    statements
}

fn push_trimmed(statements: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

fn join_terminated<S: AsRef<str>>(statements: &[S]) -> String {
    statements
        .iter()
        .map(|s| format!("{};", s.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip fences and comment lines, then re-terminate every statement with `;`.
pub fn normalize(raw: &str) -> String {
    join_terminated(&split_statements(&strip_comment_lines(&strip_fences(raw))))
}

/// Schema-stage normalization: NODE TABLE creations first, then the rest,
/// preserving relative order inside each group.
pub fn normalize_schema(raw: &str) -> String {
    let (nodes, rest): (Vec<String>, Vec<String>) =
        split_statements(&strip_comment_lines(&strip_fences(raw)))
            .into_iter()
            .partition(|s| NODE_TABLE.is_match(s));
    let ordered: Vec<String> = nodes.into_iter().chain(rest).collect();
    join_terminated(&ordered)
}

/// True when nothing but whitespace, terminators or comment lines remain.
pub fn is_effectively_empty(text: &str) -> bool {
    strip_comment_lines(&strip_fences(text))
        .lines()
        .all(|line| line.trim().trim_end_matches(';').trim().is_empty())
}
