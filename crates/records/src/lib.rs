//! Foreman QA Records
//!
//! Declarative fixture records for the remote management API. Field
//! descriptors generate valid defaults, the record base assembles an
//! instance of a static schema, the relation resolver builds the records an
//! instance depends on, and the CRUD binding pushes and pulls records
//! through an injected [`Transport`](foreman_qa_common::Transport).
//!
//! Building is pure; only [`ApiCrud`] performs I/O:
//!
//! ```ignore
//! let crud = ApiCrud::new(server.admin());
//! let medium = crud.materialize(Medium::build()?)?;
//! ```

pub mod crud;
pub mod entities;
pub mod error;
pub mod field;
pub mod record;
pub mod relation;
pub mod schema;
pub mod value;

pub use crud::ApiCrud;
pub use error::{Error, Result};
pub use field::{ConfigurationError, Field};
pub use record::{Entity, Overrides, Record};
pub use relation::{CountPolicy, Materializer};
pub use schema::{ApiBinding, Schema, SchemaBuilder};
pub use value::Value;
