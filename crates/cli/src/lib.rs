//! Foreman QA CLI
//!
//! Wrapper around the `hammer` command-line client: command runners, the
//! return-code error model, output parsing, one wrapper per subcommand and
//! factories that create CLI fixtures with generated defaults.

pub mod error;
pub mod factory;
pub mod hammer;
pub mod options;
pub mod parse;
pub mod runner;
pub mod subcommands;

pub use error::{CliError, Result};
pub use hammer::Hammer;
pub use options::Options;
pub use runner::{CommandOutput, CommandRunner, LocalRunner};
pub use subcommands::{ContentView, Entry, Org, ReportTemplate, Subcommand, TemplateInput, User};
