//! Entity schemas
//!
//! One marker type per remote resource kind. Each exposes its static
//! [`Schema`](crate::schema::Schema) through [`Entity`](crate::record::Entity).

pub mod architecture;
pub mod bookmark;
pub mod host;
pub mod medium;
pub mod operating_system;
pub mod organization;
pub mod partition_table;
pub mod report_template;
pub mod template_input;
pub mod user;

pub use architecture::Architecture;
pub use bookmark::Bookmark;
pub use host::Host;
pub use medium::{Medium, MediumDefaults};
pub use operating_system::OperatingSystem;
pub use organization::Organization;
pub use partition_table::PartitionTable;
pub use report_template::{ReportRequest, ReportTemplate, ReportTemplateActions, ScheduledReport};
pub use template_input::TemplateInput;
pub use user::User;
