use once_cell::sync::Lazy;

use crate::field::Field;
use crate::record::Entity;
use crate::schema::Schema;

/// Controllers a bookmark can be saved for
pub const CONTROLLERS: &[&str] = &[
    "architectures",
    "hosts",
    "media",
    "operatingsystems",
    "ptables",
    "report_templates",
    "users",
];

/// Saved search query
pub struct Bookmark;

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("Bookmark")
        .field("name", Field::positive_name())
        .field("controller", Field::choice(CONTROLLERS.iter().copied()))
        .field("query", Field::string("name ~ a"))
        .field("public", Field::boolean(false))
        .api("/api/bookmarks", "bookmark", &["name", "controller", "query", "public"])
        .build()
});

impl Entity for Bookmark {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
