use foreman_qa_common::StrType;
use once_cell::sync::Lazy;

use crate::field::Field;
use crate::record::Entity;
use crate::schema::Schema;

/// Local account. The server never returns `password`, so read-backs keep
/// the local value.
pub struct User;

static SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::builder("User")
        .field("login", Field::positive_name())
        .field("password", Field::random_string(StrType::Alphanumeric, 12, 16))
        .field("admin", Field::boolean(false))
        .api("/api/users", "user", &["login", "password", "admin"])
        .build()
});

impl Entity for User {
    fn schema() -> &'static Schema {
        &SCHEMA
    }
}
