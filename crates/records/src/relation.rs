//! Related-Field Resolver
//!
//! Building resolves a relation field into in-memory records: explicit ones
//! are checked against the field's bounds, otherwise a policy-chosen number
//! of fresh target records is built. Remote creation of those targets happens
//! later, when the owner is materialized.

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use foreman_qa_common::Transport;

use crate::crud::ApiCrud;
use crate::error::{Error, Result};
use crate::field::{ConfigurationError, RelatedField};
use crate::record::{Overrides, Record};
use crate::schema::Schema;
use crate::value::Value;

/// Nesting limit for generated relations
pub const MAX_DEPTH: usize = 8;

/// How many related records to build when the caller supplies none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountPolicy {
    /// Uniformly within `[min, max]`
    #[default]
    Random,
    /// Always `min`
    Minimum,
}

/// Validate caller-supplied related records
pub(crate) fn check_explicit(
    owner: &Schema,
    name: &str,
    rel: &RelatedField,
    value: Value,
) -> Result<Value> {
    let records = match value {
        Value::Related(records) => records,
        Value::Null => Vec::new(),
        other => {
            return Err(Error::Configuration {
                record: owner.name().to_string(),
                reason: format!("'{}' expects related records, got {:?}", name, other),
            })
        }
    };

    if !rel.accepts(records.len()) {
        return Err(Error::Cardinality {
            record: owner.name().to_string(),
            field: name.to_string(),
            min: rel.min,
            max: rel.max,
            actual: records.len(),
        });
    }

    let target = rel.target();
    if let Some(wrong) = records.iter().find(|r| r.schema() != target) {
        return Err(Error::Configuration {
            record: owner.name().to_string(),
            reason: format!(
                "'{}' relates to {}, got {}",
                name,
                target.name(),
                wrong.schema().name()
            ),
        });
    }

    Ok(Value::Related(records))
}

/// Build fresh related records for a field the caller left unset
pub(crate) fn generate<R: Rng + ?Sized>(
    owner: &Schema,
    name: &str,
    rel: &RelatedField,
    rng: &mut R,
    depth: usize,
) -> Result<Value> {
    let generation_error = |source| Error::FieldGeneration {
        record: owner.name().to_string(),
        field: name.to_string(),
        source,
    };

    if depth >= MAX_DEPTH {
        return Err(generation_error(ConfigurationError::TooDeep(MAX_DEPTH)));
    }
    let count = rel.count(rng).map_err(generation_error)?;

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let record = Record::build_nested(rel.target(), Overrides::new(), rng, depth + 1)?;
        records.push(Arc::new(record));
    }
    Ok(Value::Related(records))
}

/// Creates the dependency graph of a record, depth first.
///
/// Each in-memory instance is created at most once, even when several owners
/// share it. Failures are not rolled back: records created before the failing
/// one stay on the server.
pub struct Materializer<'a, T: Transport> {
    crud: &'a ApiCrud<T>,
    created: HashMap<*const Record, Arc<Record>>,
    sources: Vec<Arc<Record>>,
}

impl<'a, T: Transport> Materializer<'a, T> {
    pub fn new(crud: &'a ApiCrud<T>) -> Self {
        Self {
            crud,
            created: HashMap::new(),
            sources: Vec::new(),
        }
    }

    /// Number of records this materializer has created so far
    pub fn created(&self) -> usize {
        self.created.len()
    }

    /// Create `record` and every persisted relation it depends on
    pub fn persist(&mut self, mut record: Record) -> Result<Record> {
        if record.is_live() {
            return Ok(record);
        }
        self.persist_relations(&mut record)?;
        self.crud.create(&record)
    }

    fn persist_relations(&mut self, record: &mut Record) -> Result<()> {
        let schema = record.schema();
        for def in schema.fields() {
            let Some(rel) = def.field.relation() else {
                continue;
            };
            if !rel.persist {
                continue;
            }

            let current = record.related(def.name);
            if current.iter().all(|r| r.is_live()) {
                continue;
            }

            let mut live = Vec::with_capacity(current.len());
            for related in current.to_vec() {
                live.push(self.persist_shared(related)?);
            }
            debug!("{}.{} -> {} live record(s)", schema.name(), def.name, live.len());
            record.set(def.name, Value::Related(live))?;
        }
        Ok(())
    }

    fn persist_shared(&mut self, related: Arc<Record>) -> Result<Arc<Record>> {
        if related.is_live() {
            return Ok(related);
        }
        let key = Arc::as_ptr(&related);
        if let Some(done) = self.created.get(&key) {
            return Ok(Arc::clone(done));
        }

        let live = Arc::new(self.persist((*related).clone())?);
        info!(
            "Created dependency {} id={}",
            live.schema().name(),
            live.id().unwrap_or_default()
        );
        // sources stay alive so their addresses are not reused during this run
        self.created.insert(key, Arc::clone(&live));
        self.sources.push(related);
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Architecture, Medium, OperatingSystem};
    use crate::field::Field;
    use crate::record::Entity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_counts_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..30 {
            let medium = Record::build_with_rng(Medium::schema(), Overrides::new(), &mut rng).unwrap();
            let count = medium.related("operatingsystem").len();
            assert!((1..=3).contains(&count), "got {count}");
        }
    }

    #[test]
    fn test_explicit_records_used_as_is() {
        let os = Arc::new(OperatingSystem::build().unwrap());
        let medium = Medium::build_with(Overrides::new().set("operatingsystem", Arc::clone(&os))).unwrap();
        assert!(Arc::ptr_eq(&medium.related("operatingsystem")[0], &os));
    }

    #[test]
    fn test_explicit_count_outside_bounds() {
        let many: Vec<Arc<Record>> = (0..4)
            .map(|_| Arc::new(OperatingSystem::build().unwrap()))
            .collect();
        let err = Medium::build_with(Overrides::new().set("operatingsystem", many)).unwrap_err();
        assert!(matches!(
            err,
            Error::Cardinality { min: 1, max: 3, actual: 4, .. }
        ));

        let err = Medium::build_with(Overrides::new().none("operatingsystem")).unwrap_err();
        assert!(matches!(err, Error::Cardinality { actual: 0, .. }));
    }

    #[test]
    fn test_explicit_records_of_wrong_type() {
        let arch = Arc::new(Architecture::build().unwrap());
        let err = Medium::build_with(Overrides::new().set("operatingsystem", arch)).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_minimum_policy() {
        static MINIMAL: once_cell::sync::Lazy<Schema> = once_cell::sync::Lazy::new(|| {
            Schema::builder("Minimal")
                .field(
                    "architecture",
                    Field::many_related(Architecture::schema, 2, 6).with_policy(CountPolicy::Minimum),
                )
                .build()
        });
        let record = Record::build(&MINIMAL, Overrides::new()).unwrap();
        assert_eq!(record.related("architecture").len(), 2);
    }

    #[test]
    fn test_self_referencing_schema_hits_depth_guard() {
        fn looping() -> &'static Schema {
            &LOOPING
        }
        static LOOPING: once_cell::sync::Lazy<Schema> = once_cell::sync::Lazy::new(|| {
            Schema::builder("Looping")
                .field("parent", Field::one_related(looping))
                .build()
        });
        let err = Record::build(&LOOPING, Overrides::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::FieldGeneration {
                source: ConfigurationError::TooDeep(MAX_DEPTH),
                ..
            }
        ));
    }
}
