use foreman_qa_common::StrType;
use once_cell::sync::Lazy;

use crate::field::Field;
use crate::record::Entity;
use crate::schema::Schema;

use super::{Architecture, PartitionTable};

pub const FAMILIES: &[&str] = &["Redhat", "Debian", "Suse", "Archlinux", "Solaris"];

fn version_number(value: &str) -> bool {
    !value.is_empty() && !value.starts_with('0')
}

pub struct OperatingSystem;

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("OperatingSystem")
        .field("name", Field::positive_name())
        .field(
            "major",
            Field::random_string(StrType::Numeric, 1, 2).validated_by(version_number),
        )
        .field("minor", Field::random_string(StrType::Numeric, 1, 1))
        .field("family", Field::choice(FAMILIES.iter().copied()))
        .field("architecture", Field::many_related(Architecture::schema, 1, 2))
        .field("ptable", Field::many_related(PartitionTable::schema, 1, 1))
        .api(
            "/api/operatingsystems",
            "operatingsystem",
            &["name", "major", "minor", "family", "architecture", "ptable"],
        )
        .build()
});

impl Entity for OperatingSystem {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
