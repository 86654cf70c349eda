use once_cell::sync::Lazy;

use crate::field::Field;
use crate::record::Entity;
use crate::schema::Schema;

use super::OperatingSystem;

/// Installation medium
pub struct Medium;

/// Values baked into the medium schema when it is defined
#[derive(Debug, Clone)]
pub struct MediumDefaults {
    pub path: String,
}

impl Default for MediumDefaults {
    fn default() -> Self {
        Self {
            path: "http://mirror.centos.org/centos/6.5/os/x86_64/".to_string(),
        }
    }
}

impl Medium {
    /// Medium schema using `defaults` for generated values
    pub fn schema_with(defaults: &MediumDefaults) -> Schema {
        Schema::builder("Medium")
            .field("name", Field::positive_name())
            .field("path", Field::string(defaults.path.clone()))
            .field("operatingsystem", Field::many_related(OperatingSystem::schema, 1, 3))
            .api("/api/media", "medium", &["name", "path", "operatingsystem"])
            .build()
    }
}

static SCHEMA: Lazy<Schema> = Lazy::new(|| Medium::schema_with(&MediumDefaults::default()));

impl Entity for Medium {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
