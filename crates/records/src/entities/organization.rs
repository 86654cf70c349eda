use foreman_qa_common::StrType;
use once_cell::sync::Lazy;

use crate::field::Field;
use crate::record::Entity;
use crate::schema::Schema;

pub struct Organization;

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Organization")
        .field("name", Field::positive_name())
        .field("description", Field::random_string(StrType::Alpha, 10, 30))
        .api("/api/organizations", "organization", &["name", "description"])
        .build()
});

impl Entity for Organization {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
