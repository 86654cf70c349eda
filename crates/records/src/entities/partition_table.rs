use once_cell::sync::Lazy;

use crate::field::Field;
use crate::record::Entity;
use crate::schema::Schema;

pub const DEFAULT_LAYOUT: &str = "zerombr\nclearpart --all --initlabel\nautopart\n";

/// Partition table layout
pub struct PartitionTable;

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("PartitionTable")
        .field("name", Field::positive_name())
        .field("layout", Field::string(DEFAULT_LAYOUT))
        .field("os_family", Field::choice(super::operating_system::FAMILIES.iter().copied()))
        .api("/api/ptables", "ptable", &["name", "layout", "os_family"])
        .build()
});

impl Entity for PartitionTable {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
