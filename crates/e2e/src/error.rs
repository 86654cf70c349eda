//! Error types for acceptance runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error(transparent)]
    Records(#[from] foreman_qa_records::Error),

    #[error(transparent)]
    Cli(#[from] foreman_qa_cli::CliError),

    #[error(transparent)]
    Common(#[from] foreman_qa_common::Error),

    #[error("Server status check failed: {0}")]
    Status(String),

    #[error("Smoke check failed: {0}")]
    Smoke(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
