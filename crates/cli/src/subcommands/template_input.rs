//! `hammer template-input`

use super::{Entry, Subcommand};
use crate::error::{CliError, Result};
use crate::hammer::Hammer;
use crate::options::Options;
use crate::parse::{field, parse_info};
use crate::runner::CommandRunner;

/// Inputs of report and job templates. Every call is scoped by
/// `--template-id`.
pub struct TemplateInput;

impl Subcommand for TemplateInput {
    const COMMAND_BASE: &'static str = "template-input";

    fn create<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Entry> {
        let created = parse_info(&hammer.execute(&Self::command("create"), options)?.stdout)?;
        let id = field(&created, "id")
            .ok_or_else(|| CliError::Parse("template-input create printed no id".to_string()))?;

        let mut info = Options::new().set("id", id);
        if let Some(template) = options.get("template-id") {
            info.insert("template-id", template);
        }
        Self::info(hammer, &info)
    }
}
