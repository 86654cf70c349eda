//! `hammer report-template`

use foreman_qa_common::{wait_for, Poll};

use super::{Entry, Subcommand};
use crate::error::Result;
use crate::hammer::Hammer;
use crate::options::Options;
use crate::parse::{parse_info, parse_job_id};
use crate::runner::CommandRunner;

pub struct ReportTemplate;

impl Subcommand for ReportTemplate {
    const COMMAND_BASE: &'static str = "report-template";
}

impl ReportTemplate {
    /// Rendered report, one line per row
    pub fn generate<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Vec<String>> {
        Ok(hammer.execute_raw(&Self::command("generate"), options)?.stdout)
    }

    /// Template source
    pub fn dump<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<String> {
        Ok(hammer.execute_raw(&Self::command("dump"), options)?.stdout_text())
    }

    /// Copy a template; takes `--id`/`--name` and `--new-name`
    pub fn clone<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Entry> {
        parse_info(&hammer.execute(&Self::command("clone"), options)?.stdout)
    }

    /// Queue generation and return the job id
    pub fn schedule<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<String> {
        parse_job_id(&hammer.execute_raw(&Self::command("schedule"), options)?.stdout)
    }

    /// Output of a scheduled job; empty while the job is still running
    pub fn report_data<R: CommandRunner>(hammer: &Hammer<R>, options: &Options) -> Result<Vec<String>> {
        Ok(hammer.execute_raw(&Self::command("report-data"), options)?.stdout)
    }

    /// Schedule a report and poll `report-data` until it has output
    pub fn schedule_and_wait<R: CommandRunner>(
        hammer: &Hammer<R>,
        options: &Options,
        poll: Poll,
    ) -> Result<Vec<String>> {
        let job_id = Self::schedule(hammer, options)?;

        let mut data_options = Options::new().set("job-id", &job_id);
        for key in ["id", "name"] {
            if let Some(value) = options.get(key) {
                data_options.insert(key, value);
            }
        }

        wait_for(&format!("report {}", job_id), poll, || {
            let lines = Self::report_data(hammer, &data_options)?;
            Ok((!lines.is_empty()).then_some(lines))
        })
    }
}
