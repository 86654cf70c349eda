//! Foreman QA Common Library
//!
//! Configuration, the transport collaborator (live HTTP and the in-memory
//! server model), random fixture data and bounded polling shared by the
//! record layer, the CLI wrapper and the acceptance suites.

pub mod config;
pub mod datafactory;
pub mod error;
pub mod logging;
pub mod memory;
pub mod transport;
pub mod wait;

// Re-export commonly used types
pub use config::{CliConfig, ServerConfig, SuiteConfig, WaitConfig};
pub use datafactory::{gen_alpha, gen_string, StrType};
pub use error::{Error, Result};
pub use memory::{MemoryServer, MemorySession};
pub use transport::{HttpTransport, Method, Request, Response, Transport};
pub use wait::{wait_for, Poll};

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default location of the suite configuration file
pub fn default_config_path() -> std::path::PathBuf {
    std::env::var_os("FOREMAN_QA_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("foreman-qa.toml"))
}
