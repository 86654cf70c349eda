//! Scoped-search subset understood by the in-memory server

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

static SEARCH_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\w+)\s*(!=|=|~)\s*(?:"([^"]*)"|(\S*))$"#).expect("search term regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    NotEq,
    Like,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub op: Op,
    pub value: String,
}

impl Condition {
    pub fn matches(&self, item: &Map<String, Value>) -> bool {
        let actual = match item.get(&self.field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        match self.op {
            Op::Eq => actual == self.value,
            Op::NotEq => actual != self.value,
            Op::Like => actual.to_lowercase().contains(&self.value.to_lowercase()),
        }
    }
}

/// Parse `name = "x" and public = true` style queries
pub fn parse(query: &str) -> Result<Vec<Condition>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    query
        .split(" and ")
        .map(|term| {
            let caps = SEARCH_TERM
                .captures(term.trim())
                .ok_or_else(|| Error::InvalidRequest(format!("unsupported search term: {}", term)))?;
            let op = match &caps[2] {
                "=" => Op::Eq,
                "!=" => Op::NotEq,
                _ => Op::Like,
            };
            let value = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Ok(Condition {
                field: caps[1].to_string(),
                op,
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quoted_and_bare() {
        let conditions = parse(r#"name = "My Template" and locked=true"#).unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].value, "My Template");
        assert_eq!(conditions[1].field, "locked");
        assert_eq!(conditions[1].value, "true");
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse("name").is_err());
    }

    #[test]
    fn test_matching() {
        let item = json!({"name": "Host statuses", "public": false, "id": 4});
        let item = item.as_object().unwrap();

        let like = &parse("name ~ statuses").unwrap()[0];
        assert!(like.matches(item));
        let not_public = &parse("public != true").unwrap()[0];
        assert!(not_public.matches(item));
        let by_id = &parse("id = 5").unwrap()[0];
        assert!(!by_id.matches(item));
    }
}
