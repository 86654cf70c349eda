use once_cell::sync::Lazy;

use crate::field::Field;
use crate::record::Entity;
use crate::schema::Schema;

/// CPU architecture, e.g. `x86_64`
pub struct Architecture;

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Architecture")
        .field("name", Field::positive_name())
        .api("/api/architectures", "architecture", &["name"])
        .build()
});

impl Entity for Architecture {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
