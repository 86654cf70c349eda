//! Static record schemas
//!
//! A [`Schema`] is the ordered list of field descriptors for one record type,
//! optionally paired with the [`ApiBinding`] that maps it onto a remote
//! resource and a post-init consistency hook. Schemas are built once with
//! [`SchemaBuilder`] and shared for the life of the process.

use std::fmt;

use crate::error::{Error, Result};
use crate::field::Field;
use crate::record::Record;
use crate::value::Value;

/// Consistency hook run once after every field has a value
pub type PostInit = fn(&mut Record) -> std::result::Result<(), String>;

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub field: Field,
}

/// Pairing of a record type with a remote resource
#[derive(Debug, Clone)]
pub struct ApiBinding {
    /// Collection path, may contain `{wire_name}` placeholders
    pub path: &'static str,

    /// Key wrapping the record in request bodies
    pub json_key: &'static str,

    /// Fields sent on create
    pub create_fields: &'static [&'static str],
}

impl ApiBinding {
    /// Collection path with placeholders filled from `record`
    pub fn collection_path(&self, record: &Record) -> Result<String> {
        let mut path = String::new();
        let mut rest = self.path;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                return Err(Error::Configuration {
                    record: record.schema().name().to_string(),
                    reason: format!("unterminated placeholder in path '{}'", self.path),
                });
            };
            let key = &rest[start + 1..start + len];
            path.push_str(&rest[..start]);
            path.push_str(&placeholder(record, key)?);
            rest = &rest[start + len + 1..];
        }
        path.push_str(rest);

        Ok(path.trim_end_matches('/').to_string())
    }

    pub fn member_path(&self, record: &Record, id: i64) -> Result<String> {
        Ok(format!("{}/{}", self.collection_path(record)?, id))
    }

    pub fn is_templated(&self) -> bool {
        self.path.contains('{')
    }
}

fn placeholder(record: &Record, key: &str) -> Result<String> {
    let schema = record.schema();
    let def = schema
        .fields()
        .iter()
        .find(|def| def.field.wire_name(def.name) == key)
        .ok_or_else(|| Error::UnknownField {
            record: schema.name().to_string(),
            field: key.to_string(),
        })?;

    match record.get(def.name) {
        Some(Value::Related(targets)) => match targets.first().and_then(|t| t.id()) {
            Some(id) => Ok(id.to_string()),
            None => Err(Error::NotPersisted {
                record: schema.name().to_string(),
                field: def.name.to_string(),
                target: def
                    .field
                    .relation()
                    .map(|rel| rel.target().name())
                    .unwrap_or("record")
                    .to_string(),
            }),
        },
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(Value::Int(i)) => Ok(i.to_string()),
        _ => Err(Error::Configuration {
            record: schema.name().to_string(),
            reason: format!("'{}' has no value to fill the resource path", def.name),
        }),
    }
}

pub struct Schema {
    name: &'static str,
    fields: Vec<FieldDef>,
    binding: Option<ApiBinding>,
    post_init: Option<PostInit>,
}

impl Schema {
    pub fn builder(name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                name,
                fields: Vec::new(),
                binding: None,
                post_init: None,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|def| def.name == name)
            .map(|def| &def.field)
    }

    /// Declared name of `name`, if the schema has such a field
    pub(crate) fn field_name(&self, name: &str) -> Option<&'static str> {
        self.fields.iter().find(|def| def.name == name).map(|def| def.name)
    }

    pub fn binding(&self) -> Option<&ApiBinding> {
        self.binding.as_ref()
    }

    /// Binding or a configuration error naming this schema
    pub fn require_binding(&self) -> Result<&ApiBinding> {
        self.binding.as_ref().ok_or_else(|| Error::Configuration {
            record: self.name.to_string(),
            reason: "no API binding declared".to_string(),
        })
    }

    pub fn post_init(&self) -> Option<PostInit> {
        self.post_init
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field(
                "fields",
                &self.fields.iter().map(|def| def.name).collect::<Vec<_>>(),
            )
            .field("binding", &self.binding.as_ref().map(|b| b.path))
            .finish()
    }
}

pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declare the next field. Declaration order is generation order.
    pub fn field(mut self, name: &'static str, field: Field) -> Self {
        self.schema.fields.retain(|def| def.name != name);
        self.schema.fields.push(FieldDef { name, field });
        self
    }

    pub fn api(
        mut self,
        path: &'static str,
        json_key: &'static str,
        create_fields: &'static [&'static str],
    ) -> Self {
        self.schema.binding = Some(ApiBinding {
            path,
            json_key,
            create_fields,
        });
        self
    }

    pub fn post_init(mut self, hook: PostInit) -> Self {
        self.schema.post_init = Some(hook);
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ReportTemplate, TemplateInput};
    use crate::record::{Entity, Overrides};
    use std::sync::Arc;

    #[test]
    fn test_builder_keeps_declaration_order() {
        let schema = Schema::builder("Thing")
            .field("name", Field::positive_name())
            .field("enabled", Field::boolean(true))
            .field("path", Field::string("/srv"))
            .build();
        let names: Vec<_> = schema.fields().iter().map(|d| d.name).collect();
        assert_eq!(names, ["name", "enabled", "path"]);
        assert!(schema.binding().is_none());
        assert!(schema.require_binding().is_err());
    }

    #[test]
    fn test_redeclared_field_replaces_earlier() {
        let schema = Schema::builder("Thing")
            .field("name", Field::positive_name())
            .field("name", Field::string("fixed"))
            .build();
        assert_eq!(schema.fields().len(), 1);
        assert!(matches!(schema.field("name"), Some(Field::String(_))));
    }

    #[test]
    fn test_plain_paths() {
        let schema = Schema::builder("Thing")
            .field("name", Field::positive_name())
            .api("/api/things/", "thing", &["name"])
            .build();
        let record = Record::stub(Box::leak(Box::new(schema)), 4);
        let binding = record.schema().require_binding().unwrap();
        assert_eq!(binding.collection_path(&record).unwrap(), "/api/things");
        assert_eq!(binding.member_path(&record, 4).unwrap(), "/api/things/4");
        assert!(!binding.is_templated());
    }

    #[test]
    fn test_templated_path_needs_live_parent() {
        let template = ReportTemplate::build().unwrap();
        let input = TemplateInput::build_with(
            Overrides::new().set("template", Arc::new(template)),
        )
        .unwrap();
        let binding = TemplateInput::schema().require_binding().unwrap();
        assert!(binding.is_templated());
        assert!(matches!(
            binding.collection_path(&input),
            Err(Error::NotPersisted { .. })
        ));

        let live = TemplateInput::build_with(
            Overrides::new().set("template", Arc::new(Record::stub(ReportTemplate::schema(), 12))),
        )
        .unwrap();
        assert_eq!(
            binding.collection_path(&live).unwrap(),
            "/api/templates/12/template_inputs"
        );
    }
}
