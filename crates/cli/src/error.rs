//! CLI error model

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// The command exited with a non-zero return code
    #[error("Command \"{command}\" finished with return code {return_code}\n{stderr}")]
    ReturnCode {
        return_code: i32,
        command: String,
        stderr: String,
    },

    /// A factory could not create its entity
    #[error("Failed to create {entity}: {reason}")]
    Factory { entity: String, reason: String },

    #[error("Cannot parse command output: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] foreman_qa_common::Error),
}

impl CliError {
    pub fn return_code(&self) -> Option<i32> {
        match self {
            CliError::ReturnCode { return_code, .. } => Some(*return_code),
            _ => None,
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            CliError::ReturnCode { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CliError::Common(e) if e.is_timeout())
    }
}
