//! The `hammer` command-line client

use foreman_qa_common::{CliConfig, ServerConfig};
use tracing::{debug, warn};

use crate::error::{CliError, Result};
use crate::options::{quote, Options};
use crate::runner::{CommandOutput, CommandRunner};

const MASK: &str = "*****";

/// Builds and runs hammer command lines for one account
#[derive(Clone)]
pub struct Hammer<R: CommandRunner> {
    runner: R,
    command: String,
    output: String,
    username: String,
    password: String,
}

impl<R: CommandRunner> Hammer<R> {
    pub fn new(runner: R, cli: &CliConfig, server: &ServerConfig) -> Self {
        Self {
            runner,
            command: cli.hammer_command.clone(),
            output: cli.output.clone(),
            username: server.username.clone(),
            password: server.password.clone(),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Same hammer acting as another account
    pub fn with_user(&self, username: &str, password: &str) -> Self
    where
        R: Clone,
    {
        Self {
            runner: self.runner.clone(),
            command: self.command.clone(),
            output: self.output.clone(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Full command line. `structured` adds `--output`.
    pub fn command_line(&self, subcommand: &str, options: &Options, structured: bool) -> String {
        let mut line = format!(
            "{} --username {} --password {}",
            self.command,
            quote(&self.username),
            quote(&self.password)
        );
        if structured {
            line.push_str(" --output ");
            line.push_str(&self.output);
        }
        line.push(' ');
        line.push_str(subcommand);
        if !options.is_empty() {
            line.push(' ');
            line.push_str(&options.to_string());
        }
        line
    }

    /// Hide the password in text meant for logs and errors
    pub fn mask(&self, text: &str) -> String {
        if self.password.is_empty() {
            return text.to_string();
        }
        text.replace(&quote(&self.password), MASK)
            .replace(&self.password, MASK)
    }

    /// Run a subcommand whose output is parsed as structured data
    pub fn execute(&self, subcommand: &str, options: &Options) -> Result<CommandOutput> {
        self.run(&self.command_line(subcommand, options, true))
    }

    /// Run a subcommand whose output is plain text (help, dumps, reports)
    pub fn execute_raw(&self, subcommand: &str, options: &Options) -> Result<CommandOutput> {
        self.run(&self.command_line(subcommand, options, false))
    }

    fn run(&self, line: &str) -> Result<CommandOutput> {
        let masked = self.mask(line);
        debug!("{}", masked);

        let output = self.runner.run(line)?;
        if output.return_code != 0 {
            let stderr = self.mask(&output.stderr_text());
            warn!("{} -> return code {}", masked, output.return_code);
            return Err(CliError::ReturnCode {
                return_code: output.return_code,
                command: masked,
                stderr,
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records command lines and answers with a fixed output
    #[derive(Clone)]
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
        answer: CommandOutput,
    }

    impl CommandRunner for Recorder {
        fn run(&self, command: &str) -> Result<CommandOutput> {
            self.seen.lock().unwrap().push(command.to_string());
            Ok(self.answer.clone())
        }
    }

    fn hammer(answer: CommandOutput) -> Hammer<Recorder> {
        let server = ServerConfig {
            username: "admin".into(),
            password: "s3cret".into(),
            ..Default::default()
        };
        let runner = Recorder {
            seen: Default::default(),
            answer,
        };
        Hammer::new(runner, &CliConfig::default(), &server)
    }

    #[test]
    fn test_command_line() {
        let hammer = hammer(CommandOutput::success("{}"));
        let options = Options::new().set("name", "rt 1");
        assert_eq!(
            hammer.command_line("report-template info", &options, true),
            "hammer --username 'admin' --password 's3cret' --output json report-template info --name 'rt 1'"
        );
        assert_eq!(
            hammer.command_line("--help", &Options::new(), false),
            "hammer --username 'admin' --password 's3cret' --help"
        );
    }

    #[test]
    fn test_return_code_error_masks_password() {
        let hammer = hammer(CommandOutput::failure(70, "login s3cret rejected"));
        let err = hammer.execute("user list", &Options::new()).unwrap_err();
        assert_eq!(err.return_code(), Some(70));
        let text = err.to_string();
        assert!(!text.contains("s3cret"));
        assert!(text.contains(MASK));
        assert_eq!(err.stderr(), Some("login ***** rejected"));
    }

    #[test]
    fn test_with_user() {
        let hammer = hammer(CommandOutput::success(""));
        let other = hammer.with_user("viewer", "pw");
        assert_eq!(other.username(), "viewer");
        other.execute_raw("report-template --help", &Options::new()).unwrap();
        let seen = other.runner().seen.lock().unwrap();
        assert!(seen[0].starts_with("hammer --username 'viewer' --password 'pw' report-template"));
    }
}
