//! Fixture factories over the CLI
//!
//! Each factory fills the options the caller left out with generated
//! values, creates the object and returns its `info`. Any failure is
//! reported as [`CliError::Factory`].

use std::io::Write;

use foreman_qa_common::{datafactory::gen_email, gen_alpha};
use tracing::info;

use crate::error::{CliError, Result};
use crate::hammer::Hammer;
use crate::options::Options;
use crate::runner::CommandRunner;
use crate::subcommands::{ContentView, Entry, Org, ReportTemplate, Subcommand, TemplateInput, User};

fn factory_error(entity: &str) -> impl Fn(CliError) -> CliError + '_ {
    move |err| match err {
        CliError::Factory { .. } => err,
        other => CliError::Factory {
            entity: entity.to_string(),
            reason: other.to_string(),
        },
    }
}

fn require(options: &Options, entity: &str, key: &str) -> Result<()> {
    if options.contains(key) {
        return Ok(());
    }
    Err(CliError::Factory {
        entity: entity.to_string(),
        reason: format!("--{} is required", key),
    })
}

fn create<S: Subcommand, R: CommandRunner>(
    hammer: &Hammer<R>,
    entity: &str,
    options: &Options,
) -> Result<Entry> {
    let created = S::create(hammer, options).map_err(factory_error(entity))?;
    info!(
        "Created {} {}",
        entity,
        created.get("id").map(|id| id.to_string()).unwrap_or_default()
    );
    Ok(created)
}

/// Report template. `content` (default: random text) is written to a
/// temporary file passed as `--file`, unless `file` is given.
pub fn make_report_template<R: CommandRunner>(hammer: &Hammer<R>, mut options: Options) -> Result<Entry> {
    const ENTITY: &str = "report template";
    options.insert_default("name", || gen_alpha(10));

    let content = options.remove("content").unwrap_or_else(|| gen_alpha(20));
    let mut file = None;
    if !options.contains("file") {
        let mut tmp = tempfile::Builder::new()
            .prefix("report-template-")
            .suffix(".erb")
            .tempfile()
            .map_err(|e| factory_error(ENTITY)(e.into()))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| factory_error(ENTITY)(e.into()))?;
        options.insert("file", tmp.path().display());
        file = Some(tmp);
    }

    let created = create::<ReportTemplate, _>(hammer, ENTITY, &options);
    drop(file);
    created
}

/// Input of the report template given by `--template-id`
pub fn make_template_input<R: CommandRunner>(hammer: &Hammer<R>, mut options: Options) -> Result<Entry> {
    const ENTITY: &str = "template input";
    require(&options, ENTITY, "template-id")?;
    options.insert_default("name", || gen_alpha(10));
    options.insert_default("input-type", || "user".to_string());
    create::<TemplateInput, _>(hammer, ENTITY, &options)
}

pub fn make_org<R: CommandRunner>(hammer: &Hammer<R>, mut options: Options) -> Result<Entry> {
    options.insert_default("name", || gen_alpha(10));
    options.insert_default("description", || gen_alpha(20));
    create::<Org, _>(hammer, "organization", &options)
}

/// Content view in the organization given by `--organization-id`
pub fn make_content_view<R: CommandRunner>(hammer: &Hammer<R>, mut options: Options) -> Result<Entry> {
    const ENTITY: &str = "content view";
    require(&options, ENTITY, "organization-id")?;
    options.insert_default("name", || gen_alpha(10));
    create::<ContentView, _>(hammer, ENTITY, &options)
}

pub fn make_user<R: CommandRunner>(hammer: &Hammer<R>, mut options: Options) -> Result<Entry> {
    options.insert_default("login", || gen_alpha(10));
    options.insert_default("password", || gen_alpha(12));
    options.insert_default("mail", gen_email);
    options.insert_default("admin", || "false".to_string());
    create::<User, _>(hammer, "user", &options)
}
