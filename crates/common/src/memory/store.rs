//! Collections held by the in-memory server

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Server-side validation rules for one collection
#[derive(Debug, Clone)]
pub struct CollectionRules {
    /// Wrapper key used in request bodies, e.g. `medium`
    pub json_key: &'static str,

    /// Fields that must be present and non-blank on create
    pub required: &'static [&'static str],

    /// Field whose value must be unique within the collection
    pub unique: Option<&'static str>,

    /// Whether `locked = true` freezes the item
    pub lockable: bool,

    /// `*_id` / `*_ids` keys and the collection they point into
    pub references: &'static [(&'static str, &'static str)],

    /// Nested collections: (path segment, parent collection, parent key)
    pub parent: Option<(&'static str, &'static str, &'static str)>,

    /// Keys never rendered back to clients
    pub hidden: &'static [&'static str],
}

impl CollectionRules {
    pub const fn named(json_key: &'static str) -> Self {
        Self {
            json_key,
            required: &["name"],
            unique: Some("name"),
            lockable: false,
            references: &[],
            parent: None,
            hidden: &[],
        }
    }
}

/// Stored items of one collection
#[derive(Debug, Clone)]
pub struct Collection {
    pub rules: CollectionRules,
    pub items: BTreeMap<i64, Map<String, Value>>,
}

impl Collection {
    pub fn new(rules: CollectionRules) -> Self {
        Self {
            rules,
            items: BTreeMap::new(),
        }
    }

    /// Check required fields on a complete item
    pub fn check_required(&self, item: &Map<String, Value>) -> Result<(), String> {
        for field in self.rules.required {
            if is_blank(item.get(*field)) {
                return Err(format!("{} can't be blank", humanize(field)));
            }
        }
        Ok(())
    }

    /// Check the unique field, ignoring the item being updated
    pub fn check_unique(&self, item: &Map<String, Value>, own_id: Option<i64>) -> Result<(), String> {
        let Some(field) = self.rules.unique else {
            return Ok(());
        };
        let Some(value) = item.get(field) else {
            return Ok(());
        };
        let taken = self
            .items
            .iter()
            .any(|(id, other)| Some(*id) != own_id && other.get(field) == Some(value));
        if taken {
            Err(format!("{} has already been taken", humanize(field)))
        } else {
            Ok(())
        }
    }

    /// Copy of an item as clients see it
    pub fn render(&self, item: &Map<String, Value>) -> Map<String, Value> {
        let mut rendered = item.clone();
        for key in self.rules.hidden {
            rendered.remove(*key);
        }
        rendered
    }

    pub fn is_locked(&self, id: i64) -> bool {
        self.rules.lockable
            && self
                .items
                .get(&id)
                .and_then(|item| item.get("locked"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }
}

/// Ids referenced by a `*_id` or `*_ids` value
pub fn referenced_ids(value: &Value) -> Vec<Option<i64>> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(values) => values.iter().map(as_id).collect(),
        other => vec![as_id(other)],
    }
}

pub fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn humanize(field: &str) -> String {
    let mut text = field.trim_end_matches("_id").replace('_', " ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text
}
