//! Per-instance field values

use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;

use crate::record::Record;

/// Value held by one field of a [`Record`]
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(String),

    /// Related records, shared with any other owner that references them
    Related(Vec<Arc<Record>>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_related(&self) -> &[Arc<Record>] {
        match self {
            Value::Related(records) => records,
            _ => &[],
        }
    }

    /// Wire representation of a scalar value. Relations serialize through
    /// [`Record::payload`], which knows whether the targets are live.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Str(s) => Json::String(s.clone()),
            Value::Related(records) => Json::Array(
                records
                    .iter()
                    .map(|r| r.id().map(Json::from).unwrap_or(Json::Null))
                    .collect(),
            ),
        }
    }

    /// Scalar value from a server response
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Str(n.to_string()),
            },
            Json::String(s) => Value::Str(s.clone()),
            other => Value::Str(other.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Related(a), Value::Related(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{:?}", b),
            Value::Int(i) => write!(f, "{:?}", i),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Related(records) => f
                .debug_list()
                .entries(records.iter().map(|r| Reference(r)))
                .finish(),
        }
    }
}

/// Short form used when a record is printed as someone else's relation
struct Reference<'a>(&'a Record);

impl fmt::Debug for Reference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.id() {
            Some(id) => write!(f, "{}#{}", self.0.schema().name(), id),
            None => write!(f, "{}(unsaved)", self.0.schema().name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Arc<Record>> for Value {
    fn from(value: Arc<Record>) -> Self {
        Value::Related(vec![value])
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Related(vec![Arc::new(value)])
    }
}

impl From<Vec<Arc<Record>>> for Value {
    fn from(value: Vec<Arc<Record>>) -> Self {
        Value::Related(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(&json!(null)), Value::Null);
        assert_eq!(Value::from_json(&json!(true)), Value::Bool(true));
        assert_eq!(Value::from_json(&json!(7)), Value::Int(7));
        assert_eq!(Value::from_json(&json!("x")), Value::Str("x".into()));
        assert_eq!(Value::from_json(&json!(1.5)), Value::Str("1.5".into()));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Str("a".into()));
    }

    #[test]
    fn test_scalar_to_json() {
        assert_eq!(Value::from("name").to_json(), json!("name"));
        assert_eq!(Value::from(false).to_json(), json!(false));
        assert_eq!(Value::Null.to_json(), json!(null));
    }
}
