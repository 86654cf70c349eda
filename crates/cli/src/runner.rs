//! Command execution

use std::process::Command;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;

/// Captured result of one command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub return_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CommandOutput {
    pub fn success(stdout: &str) -> Self {
        Self {
            return_code: 0,
            stdout: lines(stdout),
            stderr: Vec::new(),
        }
    }

    pub fn failure(return_code: i32, stderr: &str) -> Self {
        Self {
            return_code,
            stdout: Vec::new(),
            stderr: lines(stderr),
        }
    }

    pub fn stdout_text(&self) -> String {
        self.stdout.join("\n")
    }

    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }
}

fn lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Runs a full command line and captures its output
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        (**self).run(command)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        (**self).run(command)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        (**self).run(command)
    }
}

/// Runs commands through `sh -c` on this machine
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRunner;

impl CommandRunner for LocalRunner {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        let output = Command::new("sh").arg("-c").arg(command).output()?;
        let result = CommandOutput {
            return_code: output.status.code().unwrap_or(-1),
            stdout: lines(&String::from_utf8_lossy(&output.stdout)),
            stderr: lines(&String::from_utf8_lossy(&output.stderr)),
        };
        debug!("exit {} ({} stdout lines)", result.return_code, result.stdout.len());
        Ok(result)
    }
}
