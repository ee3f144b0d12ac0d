//! Scoring heuristic deciding whether free text looks like a graph query
//!
//! Used to tell a pasted query apart from prose to import. Structural
//! patterns weigh 2, each keyword occurrence weighs 1; obvious SQL and very
//! short inputs are penalized.

use std::sync::LazyLock;

use regex::Regex;

const THRESHOLD: i32 = 3;

static STRUCTURAL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // (n:Label)
        r"\([A-Za-z_][A-Za-z0-9_]*\s*:\s*[A-Za-z_][A-Za-z0-9_]*\)",
        // (a)-[r]->(b)
        r"\([^)]*\)-\[[^\]]*\]->\([^)]*\)",
        // (a)<-[r]-(b)
        r"\([^)]*\)<-\[[^\]]*\]-\([^)]*\)",
        r"-[>\]]\(",
        // :Label
        r":\s*[A-Za-z_][A-Za-z0-9_]*",
        // $param
        r"\$[A-Za-z_][A-Za-z0-9_]*",
        // {k: v}
        r"\{[^}]*:[^}]*\}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(MATCH|RETURN|WHERE|WITH|UNWIND|MERGE|CREATE|DELETE|DETACH|SET|REMOVE|CALL|YIELD|LOAD\s+CSV|OPTIONAL\s+MATCH|LIMIT|SKIP|ORDER\s+BY|FOREACH|TOINTEGER|TOFLOAT|TOLIST|SPLIT|EXISTS|LABELS|NODES|RELATIONSHIPS|ID)\b",
    )
    .expect("valid regex")
});

static SQL_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(SELECT|FROM|JOIN|GROUP\s+BY|INSERT|UPDATE|TABLE)\b").expect("valid regex")
});

/// Raw score of `input`; see [`looks_like_query`].
pub fn query_score(input: &str) -> i32 {
    let s = input.trim();
    let mut score = 0i32;

    score += 2 * STRUCTURAL.iter().filter(|r| r.is_match(s)).count() as i32;
    score += KEYWORDS.find_iter(s).count() as i32;

    if SQL_WORDS.is_match(s) {
        score -= 3;
    }
    if s.chars().count() < 8 {
        score -= 1;
    }
    score
}

/// True when `input` scores at or above the query threshold.
pub fn looks_like_query(input: &str) -> bool {
    if input.trim().is_empty() {
        return false;
    }
    query_score(input) >= THRESHOLD
}
