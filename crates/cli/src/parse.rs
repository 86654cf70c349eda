//! Parsing of hammer output
//!
//! Structured commands run with `--output json`. Keys are normalised the same
//! way everywhere: lower case, spaces turned into dashes, so `"Template
//! inputs"` becomes `"template-inputs"`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{CliError, Result};

static JOB_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)job id:\s*(\S+)").expect("job id regex"));

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace([' ', '_'], "-")
}

/// Recursively normalise every object key in `value`
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (normalize_key(&k), normalize(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Parse JSON stdout; empty output is `null`
pub fn parse_json(stdout: &[String]) -> Result<Value> {
    let text = stdout.join("\n");
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(normalize(serde_json::from_str(&text)?))
}

/// A single object, as printed by `info` and `create`
pub fn parse_info(stdout: &[String]) -> Result<Map<String, Value>> {
    match parse_json(stdout)? {
        Value::Object(map) => Ok(map),
        Value::Array(mut items) if items.len() == 1 => match items.remove(0) {
            Value::Object(map) => Ok(map),
            other => Err(CliError::Parse(format!("expected an object, got {}", other))),
        },
        other => Err(CliError::Parse(format!("expected an object, got {}", other))),
    }
}

/// A list of objects, as printed by `list`. A single object becomes a
/// one-element list.
pub fn parse_list(stdout: &[String]) -> Result<Vec<Map<String, Value>>> {
    let items = match parse_json(stdout)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => return Err(CliError::Parse(format!("expected a list, got {}", other))),
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(CliError::Parse(format!("expected an object, got {}", other))),
        })
        .collect()
}

/// Job id announced by `report-template schedule`
pub fn parse_job_id(stdout: &[String]) -> Result<String> {
    stdout
        .iter()
        .find_map(|line| JOB_ID.captures(line).map(|caps| caps[1].to_string()))
        .ok_or_else(|| CliError::Parse("no job id in schedule output".to_string()))
}

/// Field of a parsed object as text; numbers and booleans are stringified
pub fn field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test_case("Name", "name")]
    #[test_case("Template inputs", "template-inputs")]
    #[test_case(" Job_ID ", "job-id")]
    fn test_normalize_key(raw: &str, expected: &str) {
        assert_eq!(normalize_key(raw), expected);
    }

    #[test]
    fn test_parse_info_nested() {
        let out = lines(r#"{"Id": 3, "Name": "rt", "Template inputs": [{"Id": 9, "Name": "hosts"}]}"#);
        let info = parse_info(&out).unwrap();
        assert_eq!(field(&info, "id").as_deref(), Some("3"));
        assert_eq!(info["template-inputs"][0]["name"], "hosts");
    }

    #[test]
    fn test_parse_list() {
        assert!(parse_list(&[]).unwrap().is_empty());
        let out = lines("[\n{\"Name\": \"a\"},\n{\"Name\": \"b\"}\n]");
        let list = parse_list(&out).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1]["name"], "b");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_info(&lines("[1, 2]")), Err(CliError::Parse(_))));
        assert!(matches!(parse_json(&lines("not json")), Err(CliError::Json(_))));
    }

    #[test]
    fn test_parse_job_id() {
        let out = lines("Report scheduled.\nJob ID: 6f1e-22");
        assert_eq!(parse_job_id(&out).unwrap(), "6f1e-22");
        assert!(parse_job_id(&lines("nothing")).is_err());
    }
}
