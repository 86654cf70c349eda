//! Field descriptors
//!
//! A descriptor states what kind of value a record attribute holds and how a
//! default is produced when the caller does not supply one. Descriptors hold
//! no per-instance state; generated values live on the [`Record`].
//!
//! [`Record`]: crate::record::Record

use foreman_qa_common::datafactory::{gen_string_with, StrType};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::relation::CountPolicy;
use crate::schema::Schema;
use crate::value::Value;

/// How many times a random generator may retry its validity check
const MAX_ATTEMPTS: usize = 32;

/// Constraints a descriptor cannot satisfy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("length range {min}..={max} is empty")]
    EmptyLengthRange { min: usize, max: usize },

    #[error("cardinality range [{min}, {max}] is empty")]
    EmptyCardinality { min: usize, max: usize },

    #[error("no allowed values to choose from")]
    EmptyChoices,

    #[error("default value '{0}' fails the field's validity check")]
    InvalidDefault(String),

    #[error("no valid value after {0} attempts")]
    Exhausted(usize),

    #[error("relations nest deeper than {0} levels")]
    TooDeep(usize),

    #[error("relation fields are resolved by the relation resolver")]
    Relation,
}

/// Validity predicate applied to generated strings
pub type Validator = fn(&str) -> bool;

/// Lazily resolved target of a relation field
pub type SchemaRef = fn() -> &'static Schema;

pub fn non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

#[derive(Debug, Clone)]
pub enum StringSource {
    Fixed(String),
    Random {
        kind: StrType,
        min_len: usize,
        max_len: usize,
    },
}

#[derive(Debug, Clone)]
pub struct StringField {
    pub source: StringSource,
    pub validator: Validator,
}

/// Name that the server accepts: a letter followed by ASCII alphanumerics
#[derive(Debug, Clone, Copy)]
pub struct BasicPositiveField {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for BasicPositiveField {
    fn default() -> Self {
        Self {
            min_len: 8,
            max_len: 16,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BooleanField {
    pub default: bool,
}

#[derive(Debug, Clone)]
pub struct ChoiceField {
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RelatedField {
    pub target: SchemaRef,
    pub min: usize,
    pub max: usize,
    pub policy: CountPolicy,

    /// Related records must exist remotely before the owner is created
    pub persist: bool,
}

impl RelatedField {
    pub fn target(&self) -> &'static Schema {
        (self.target)()
    }

    /// Number of records to build when none are supplied
    pub fn count<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize, ConfigurationError> {
        if self.min > self.max {
            return Err(ConfigurationError::EmptyCardinality {
                min: self.min,
                max: self.max,
            });
        }
        Ok(match self.policy {
            CountPolicy::Minimum => self.min,
            CountPolicy::Random => rng.gen_range(self.min..=self.max),
        })
    }

    pub fn accepts(&self, count: usize) -> bool {
        self.min <= count && count <= self.max
    }
}

#[derive(Debug, Clone)]
pub enum Field {
    String(StringField),
    PositiveName(BasicPositiveField),
    Boolean(BooleanField),
    Choice(ChoiceField),
    OneRelated(RelatedField),
    ManyRelated(RelatedField),
}

impl Field {
    /// String with a fixed default
    pub fn string(default: impl Into<String>) -> Self {
        Field::String(StringField {
            source: StringSource::Fixed(default.into()),
            validator: non_blank,
        })
    }

    /// Random string of `kind` with a length in `min_len..=max_len`
    pub fn random_string(kind: StrType, min_len: usize, max_len: usize) -> Self {
        Field::String(StringField {
            source: StringSource::Random {
                kind,
                min_len,
                max_len,
            },
            validator: non_blank,
        })
    }

    pub fn positive_name() -> Self {
        Field::PositiveName(BasicPositiveField::default())
    }

    pub fn boolean(default: bool) -> Self {
        Field::Boolean(BooleanField { default })
    }

    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Field::Choice(ChoiceField {
            choices: choices.into_iter().map(Into::into).collect(),
        })
    }

    /// Exactly one related record, created remotely before the owner
    pub fn one_related(target: SchemaRef) -> Self {
        Field::OneRelated(RelatedField {
            target,
            min: 1,
            max: 1,
            policy: CountPolicy::Minimum,
            persist: true,
        })
    }

    /// Between `min` and `max` related records, created remotely before the owner
    pub fn many_related(target: SchemaRef, min: usize, max: usize) -> Self {
        Field::ManyRelated(RelatedField {
            target,
            min,
            max,
            policy: CountPolicy::Random,
            persist: true,
        })
    }

    /// Replace the validity predicate of a string field
    pub fn validated_by(mut self, validator: Validator) -> Self {
        if let Field::String(field) = &mut self {
            field.validator = validator;
        }
        self
    }

    /// Replace the count policy of a relation field
    pub fn with_policy(mut self, policy: CountPolicy) -> Self {
        if let Field::OneRelated(rel) | Field::ManyRelated(rel) = &mut self {
            rel.policy = policy;
        }
        self
    }

    /// Relation targets stay in memory and are not created remotely
    pub fn transient(mut self) -> Self {
        if let Field::OneRelated(rel) | Field::ManyRelated(rel) = &mut self {
            rel.persist = false;
        }
        self
    }

    pub fn relation(&self) -> Option<&RelatedField> {
        match self {
            Field::OneRelated(rel) | Field::ManyRelated(rel) => Some(rel),
            _ => None,
        }
    }

    pub fn is_relation(&self) -> bool {
        self.relation().is_some()
    }

    /// Key used for this field in API payloads
    pub fn wire_name(&self, name: &str) -> String {
        match self {
            Field::OneRelated(_) => format!("{}_id", name),
            Field::ManyRelated(_) => format!("{}_ids", name),
            _ => name.to_string(),
        }
    }

    /// Produce a default value for a scalar field
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Value, ConfigurationError> {
        match self {
            Field::String(field) => field.generate(rng).map(Value::Str),
            Field::PositiveName(field) => field.generate(rng).map(Value::Str),
            Field::Boolean(field) => Ok(Value::Bool(field.default)),
            Field::Choice(field) => field
                .choices
                .choose(rng)
                .map(|choice| Value::Str(choice.clone()))
                .ok_or(ConfigurationError::EmptyChoices),
            Field::OneRelated(_) | Field::ManyRelated(_) => Err(ConfigurationError::Relation),
        }
    }
}

fn pick_len<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> Result<usize, ConfigurationError> {
    if min > max || max == 0 {
        return Err(ConfigurationError::EmptyLengthRange { min, max });
    }
    Ok(rng.gen_range(min.max(1)..=max))
}

impl StringField {
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, ConfigurationError> {
        match &self.source {
            StringSource::Fixed(value) => {
                if (self.validator)(value) {
                    Ok(value.clone())
                } else {
                    Err(ConfigurationError::InvalidDefault(value.clone()))
                }
            }
            StringSource::Random {
                kind,
                min_len,
                max_len,
            } => {
                for _ in 0..MAX_ATTEMPTS {
                    let len = pick_len(rng, *min_len, *max_len)?;
                    let candidate = gen_string_with(rng, *kind, len);
                    if (self.validator)(&candidate) {
                        return Ok(candidate);
                    }
                }
                Err(ConfigurationError::Exhausted(MAX_ATTEMPTS))
            }
        }
    }
}

impl BasicPositiveField {
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, ConfigurationError> {
        let len = pick_len(rng, self.min_len, self.max_len)?;
        let mut name = gen_string_with(rng, StrType::Alpha, 1);
        name.push_str(&gen_string_with(rng, StrType::Alphanumeric, len - 1));
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Architecture;
    use crate::record::Entity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_case::test_case;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_positive_name_shape() {
        let mut rng = rng();
        for _ in 0..50 {
            let name = BasicPositiveField::default().generate(&mut rng).unwrap();
            assert!((8..=16).contains(&name.len()));
            assert!(name.chars().next().unwrap().is_ascii_alphabetic());
            assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_fixed_string_default() {
        let field = Field::string("http://mirror.example.com/os/");
        assert_eq!(
            field.generate(&mut rng()).unwrap(),
            Value::Str("http://mirror.example.com/os/".into())
        );
    }

    #[test]
    fn test_fixed_default_must_pass_validator() {
        let field = Field::string("   ");
        assert_eq!(
            field.generate(&mut rng()).unwrap_err(),
            ConfigurationError::InvalidDefault("   ".into())
        );
    }

    #[test]
    fn test_random_string_respects_validator() {
        fn no_leading_zero(s: &str) -> bool {
            !s.starts_with('0')
        }
        let field = Field::random_string(StrType::Numeric, 1, 2).validated_by(no_leading_zero);
        let mut rng = rng();
        for _ in 0..50 {
            let Value::Str(value) = field.generate(&mut rng).unwrap() else {
                panic!("expected a string");
            };
            assert!(!value.starts_with('0'));
        }
    }

    #[test]
    fn test_unsatisfiable_validator_is_exhausted() {
        let field = Field::random_string(StrType::Alpha, 3, 3).validated_by(|_| false);
        assert_eq!(
            field.generate(&mut rng()).unwrap_err(),
            ConfigurationError::Exhausted(MAX_ATTEMPTS)
        );
    }

    #[test_case(5, 2 ; "min above max")]
    #[test_case(0, 0 ; "zero length")]
    fn test_empty_length_range(min: usize, max: usize) {
        let field = Field::random_string(StrType::Alpha, min, max);
        assert_eq!(
            field.generate(&mut rng()).unwrap_err(),
            ConfigurationError::EmptyLengthRange { min, max }
        );
    }

    #[test_case(StrType::Alpha)]
    #[test_case(StrType::Numeric)]
    #[test_case(StrType::Utf8)]
    #[test_case(StrType::Html)]
    fn test_random_string_kinds_are_non_blank(kind: StrType) {
        let field = Field::random_string(kind, 4, 12);
        let mut rng = rng();
        for _ in 0..20 {
            let value = field.generate(&mut rng).unwrap();
            assert!(non_blank(value.as_str().unwrap()));
        }
    }

    #[test]
    fn test_empty_choices() {
        let field = Field::choice(Vec::<String>::new());
        assert_eq!(field.generate(&mut rng()).unwrap_err(), ConfigurationError::EmptyChoices);
    }

    #[test]
    fn test_choice_picks_allowed_value() {
        let field = Field::choice(["Redhat", "Debian"]);
        let value = field.generate(&mut rng()).unwrap();
        assert!(value == Value::Str("Redhat".into()) || value == Value::Str("Debian".into()));
    }

    #[test]
    fn test_boolean_default() {
        assert_eq!(Field::boolean(true).generate(&mut rng()).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_wire_names() {
        let target = Architecture::schema;
        assert_eq!(Field::one_related(target).wire_name("medium"), "medium_id");
        assert_eq!(Field::many_related(target, 1, 3).wire_name("architecture"), "architecture_ids");
        assert_eq!(Field::boolean(false).wire_name("locked"), "locked");
    }

    #[test]
    fn test_cardinality_count() {
        let target = Architecture::schema;
        let mut rng = rng();
        let field = Field::many_related(target, 1, 3);
        let rel = field.relation().unwrap();
        for _ in 0..50 {
            let count = rel.count(&mut rng).unwrap();
            assert!(rel.accepts(count));
        }

        let minimum = Field::many_related(target, 2, 5).with_policy(CountPolicy::Minimum);
        assert_eq!(minimum.relation().unwrap().count(&mut rng).unwrap(), 2);

        let empty = Field::many_related(target, 3, 1);
        assert_eq!(
            empty.relation().unwrap().count(&mut rng).unwrap_err(),
            ConfigurationError::EmptyCardinality { min: 3, max: 1 }
        );
    }
}
