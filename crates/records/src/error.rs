//! Error types for record construction and CRUD bindings

use thiserror::Error;

use crate::field::ConfigurationError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{record}.{field}: cannot generate a value: {source}")]
    FieldGeneration {
        record: String,
        field: String,
        #[source]
        source: ConfigurationError,
    },

    #[error("{record} has no field named '{field}'")]
    UnknownField { record: String, field: String },

    #[error("{record}.{field}: expected between {min} and {max} related records, got {actual}")]
    Cardinality {
        record: String,
        field: String,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("{record} failed its consistency check: {reason}")]
    PostInit { record: String, reason: String },

    #[error("{record}.{field} references a {target} that has not been created remotely")]
    NotPersisted {
        record: String,
        field: String,
        target: String,
    },

    #[error("{record} has no remote id")]
    NotLive { record: String },

    #[error("{record}: {reason}")]
    Configuration { record: String, reason: String },

    #[error("Failed to create {resource}: {message}")]
    RemoteCreate {
        resource: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to read {resource}: {message}")]
    RemoteRead {
        resource: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to update {resource}: {message}")]
    RemoteUpdate {
        resource: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Failed to delete {resource}: {message}")]
    RemoteDelete {
        resource: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{resource} {action} failed: {message}")]
    RemoteAction {
        resource: String,
        action: String,
        status: Option<u16>,
        message: String,
    },

    #[error("No {resource} matches '{query}'")]
    NotFound { resource: String, query: String },

    #[error("{count} {resource} records match '{query}', expected exactly one")]
    AmbiguousResult {
        resource: String,
        query: String,
        count: usize,
    },

    #[error("Malformed {resource} response: {reason}")]
    MalformedResponse { resource: String, reason: String },

    #[error(transparent)]
    Common(#[from] foreman_qa_common::Error),
}

impl Error {
    /// HTTP status reported by the server, when the failure came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteCreate { status, .. }
            | Error::RemoteRead { status, .. }
            | Error::RemoteUpdate { status, .. }
            | Error::RemoteDelete { status, .. }
            | Error::RemoteAction { status, .. } => *status,
            Error::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Common(e) if e.is_timeout())
    }
}
