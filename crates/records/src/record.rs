//! Record Base
//!
//! A [`Record`] is one fixture instance of a [`Schema`]. Building is pure: it
//! generates a value for every declared field that the caller did not
//! override, resolves relation fields into in-memory related records and runs
//! the schema's post-init hook. Nothing touches the network until the record
//! is handed to [`ApiCrud`](crate::crud::ApiCrud).

use rand::Rng;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::field::Field;
use crate::relation;
use crate::schema::{FieldDef, Schema};
use crate::value::Value;

/// Explicit field values supplied when building a record
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: Vec<(String, Value)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        self.values.retain(|(n, _)| *n != name);
        self.values.push((name, value.into()));
        self
    }

    /// Explicitly leave `name` without a value
    pub fn none(self, name: impl Into<String>) -> Self {
        self.set(name, Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A record type with a statically defined schema
pub trait Entity {
    fn schema() -> &'static Schema;

    /// Build with every field generated
    fn build() -> Result<Record> {
        Record::build(Self::schema(), Overrides::new())
    }

    fn build_with(overrides: Overrides) -> Result<Record> {
        Record::build(Self::schema(), overrides)
    }
}

#[derive(Clone)]
pub struct Record {
    schema: &'static Schema,
    id: Option<i64>,
    values: BTreeMap<&'static str, Value>,
    overridden: BTreeSet<&'static str>,
}

impl Record {
    pub fn build(schema: &'static Schema, overrides: Overrides) -> Result<Self> {
        Self::build_with_rng(schema, overrides, &mut rand::thread_rng())
    }

    pub fn build_with_rng<R: Rng + ?Sized>(
        schema: &'static Schema,
        overrides: Overrides,
        rng: &mut R,
    ) -> Result<Self> {
        Self::build_nested(schema, overrides, rng, 0)
    }

    pub(crate) fn build_nested<R: Rng + ?Sized>(
        schema: &'static Schema,
        overrides: Overrides,
        rng: &mut R,
        depth: usize,
    ) -> Result<Self> {
        let mut explicit = BTreeMap::new();
        for (name, value) in overrides.values {
            let Some(name) = schema.field_name(&name) else {
                return Err(Error::UnknownField {
                    record: schema.name().to_string(),
                    field: name,
                });
            };
            explicit.insert(name, value);
        }

        let mut record = Self::empty(schema);
        for def in schema.fields() {
            let (name, field) = (def.name, &def.field);
            let value = match (explicit.remove(name), field.relation()) {
                (Some(value), Some(rel)) => {
                    record.overridden.insert(name);
                    relation::check_explicit(schema, name, rel, value)?
                }
                (Some(Value::Related(_)), None) => {
                    return Err(Error::Configuration {
                        record: schema.name().to_string(),
                        reason: format!("'{}' holds a scalar, not related records", name),
                    });
                }
                (Some(value), None) => {
                    record.overridden.insert(name);
                    value
                }
                (None, Some(rel)) => relation::generate(schema, name, rel, rng, depth)?,
                (None, None) => field.generate(rng).map_err(|source| Error::FieldGeneration {
                    record: schema.name().to_string(),
                    field: name.to_string(),
                    source,
                })?,
            };
            record.values.insert(name, value);
        }

        if let Some(hook) = schema.post_init() {
            hook(&mut record).map_err(|reason| Error::PostInit {
                record: schema.name().to_string(),
                reason,
            })?;
        }

        debug!("Built {} ({} overrides)", schema.name(), record.overridden.len());
        Ok(record)
    }

    fn empty(schema: &'static Schema) -> Self {
        Self {
            schema,
            id: None,
            values: BTreeMap::new(),
            overridden: BTreeSet::new(),
        }
    }

    /// Reference to an existing remote object whose fields are unknown
    pub fn stub(schema: &'static Schema, id: i64) -> Self {
        let mut record = Self::empty(schema);
        record.id = Some(id);
        for def in schema.fields() {
            record.values.insert(def.name, Value::Null);
        }
        record
    }

    /// Record holding exactly what the server returned
    pub fn from_remote(schema: &'static Schema, body: &Map<String, Json>) -> Self {
        let mut record = Self::empty(schema);
        for def in schema.fields() {
            record.values.insert(def.name, Value::Null);
        }
        record.merge_remote(body);
        record
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn is<E: Entity>(&self) -> bool {
        self.schema == E::schema()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Whether the record exists on the remote system
    pub fn is_live(&self) -> bool {
        self.id.is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn related(&self, name: &str) -> &[Arc<Record>] {
        self.get(name).map(Value::as_related).unwrap_or(&[])
    }

    /// Fields in declaration order
    pub fn values(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.schema
            .fields()
            .iter()
            .filter_map(|def| self.values.get(def.name).map(|v| (def.name, v)))
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let Some(name) = self.schema.field_name(name) else {
            return Err(self.unknown(name));
        };
        self.values.insert(name, value.into());
        Ok(())
    }

    /// Whether `name` was supplied by the caller rather than generated
    pub fn is_overridden(&self, name: &str) -> bool {
        self.overridden.contains(name)
    }

    /// Same in-memory instance, or the same remote object
    pub fn same_as(&self, other: &Record) -> bool {
        std::ptr::eq(self, other)
            || (self.schema == other.schema && self.id.is_some() && self.id == other.id)
    }

    fn unknown(&self, name: &str) -> Error {
        Error::UnknownField {
            record: self.schema.name().to_string(),
            field: name.to_string(),
        }
    }

    /// Wire representation of `fields`, keyed by wire name.
    ///
    /// Relations serialize to remote ids, so every related record must be
    /// live.
    pub fn payload(&self, fields: &[&str]) -> Result<Map<String, Json>> {
        let mut payload = Map::new();
        for name in fields {
            let Some(def) = self.schema.fields().iter().find(|def| def.name == *name) else {
                return Err(self.unknown(name));
            };
            let value = self.values.get(def.name).unwrap_or(&Value::Null);
            let json = match (&def.field, value) {
                (Field::OneRelated(_) | Field::ManyRelated(_), Value::Related(targets)) => {
                    let mut ids = Vec::with_capacity(targets.len());
                    for target in targets {
                        let id = target.id().ok_or_else(|| Error::NotPersisted {
                            record: self.schema.name().to_string(),
                            field: def.name.to_string(),
                            target: target.schema().name().to_string(),
                        })?;
                        ids.push(Json::from(id));
                    }
                    match def.field {
                        Field::OneRelated(_) => ids.into_iter().next().unwrap_or(Json::Null),
                        _ => Json::Array(ids),
                    }
                }
                (Field::ManyRelated(_), Value::Null) => Json::Array(Vec::new()),
                (_, value) => value.to_json(),
            };
            payload.insert(def.field.wire_name(def.name), json);
        }
        Ok(payload)
    }

    /// Overwrite local values with the fields present in a server response.
    ///
    /// Relations present in the response become id-only stubs, unless the
    /// local related records already point at the same remote ids.
    pub fn merge_remote(&mut self, body: &Map<String, Json>) {
        if let Some(id) = body.get("id").and_then(Json::as_i64) {
            self.id = Some(id);
        }

        for def in self.schema.fields() {
            match def.field.relation() {
                Some(rel) => {
                    let Some(ids) = remote_ids(body, def) else {
                        continue;
                    };
                    let current: Vec<Option<i64>> =
                        self.related(def.name).iter().map(|r| r.id()).collect();
                    if current.iter().copied().eq(ids.iter().copied().map(Some)) {
                        continue;
                    }
                    let stubs = ids
                        .into_iter()
                        .map(|id| Arc::new(Record::stub(rel.target(), id)))
                        .collect();
                    self.values.insert(def.name, Value::Related(stubs));
                }
                None => {
                    if let Some(json) = body.get(def.name) {
                        self.values.insert(def.name, Value::from_json(json));
                    }
                }
            }
        }
    }
}

/// Remote ids of a relation field, if the response mentions it
fn remote_ids(body: &Map<String, Json>, def: &FieldDef) -> Option<Vec<i64>> {
    let wire = def.field.wire_name(def.name);
    if let Some(json) = body.get(&wire) {
        return Some(match json {
            Json::Array(items) => items.iter().filter_map(Json::as_i64).collect(),
            other => other.as_i64().into_iter().collect(),
        });
    }

    // nested object form, e.g. "medium": {"id": 3, "name": "..."}; show
    // responses nest many-relations under the plural key
    let nested = match def.field {
        Field::ManyRelated(_) => body
            .get(def.name)
            .or_else(|| body.get(&format!("{}s", def.name)))?,
        _ => body.get(def.name)?,
    };
    match nested {
        Json::Object(obj) => Some(obj.get("id").and_then(Json::as_i64).into_iter().collect()),
        Json::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Json::as_i64))
                .collect(),
        ),
        _ => None,
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        s.field("id", &self.id);
        for (name, value) in self.values() {
            s.field(name, value);
        }
        s.finish()
    }
}
