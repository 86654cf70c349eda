//! Wrappers for hammer subcommands
//!
//! Every wrapper is a marker type implementing [`Subcommand`]; the shared
//! operations are provided methods keyed by `COMMAND_BASE`.

pub mod content_view;
pub mod org;
pub mod report_template;
pub mod template_input;
pub mod user;

pub use content_view::ContentView;
pub use org::Org;
pub use report_template::ReportTemplate;
pub use template_input::TemplateInput;
pub use user::User;

use serde_json::{Map, Value};

use crate::error::{CliError, Result};
use crate::hammer::Hammer;
use crate::options::Options;
use crate::parse::{field, parse_info, parse_list};
use crate::runner::CommandRunner;

/// Parsed object printed by hammer
pub type Entry = Map<String, Value>;

pub trait Subcommand {
    /// First word(s) of the hammer command, e.g. `report-template`
    const COMMAND_BASE: &'static str;

    fn command(action: &str) -> String {
        format!("{} {}", Self::COMMAND_BASE, action)
    }

    fn info<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Entry> {
        parse_info(&hammer.execute(&Self::command("info"), options)?.stdout)
    }

    fn list<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Vec<Entry>> {
        parse_list(&hammer.execute(&Self::command("list"), options)?.stdout)
    }

    /// Create, then return the full `info` of the new object
    fn create<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Entry> {
        let created = parse_info(&hammer.execute(&Self::command("create"), options)?.stdout)?;
        let id = field(&created, "id").ok_or_else(|| {
            CliError::Parse(format!("{} create printed no id", Self::COMMAND_BASE))
        })?;
        Self::info(hammer, &Options::new().set("id", id))
    }

    fn update<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Vec<Entry>> {
        parse_list(&hammer.execute(&Self::command("update"), options)?.stdout)
    }

    fn delete<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Vec<Entry>> {
        parse_list(&hammer.execute(&Self::command("delete"), options)?.stdout)
    }

    /// First object matching `search`, if any
    fn exists<R: CommandRunner>(hammer: &Hammer<R>, search: &str) -> Result<Option<Entry>> {
        let mut found = Self::list(hammer, &Options::new().set("search", search))?;
        Ok((!found.is_empty()).then(|| found.remove(0)))
    }

    /// Help text of the base command, or of one of its actions
    fn help<R: CommandRunner>(hammer: &Hammer<R>, action: Option<&str>) -> Result<Vec<String>> {
        let command = match action {
            Some(action) => format!("{} --help", Self::command(action)),
            None => format!("{} --help", Self::COMMAND_BASE),
        };
        Ok(hammer.execute_raw(&command, &Options::new())?.stdout)
    }
}

/// Help of hammer itself
pub fn hammer_help<R: CommandRunner>(hammer: &Hammer<R>) -> Result<Vec<String>> {
    Ok(hammer.execute_raw("--help", &Options::new())?.stdout)
}
