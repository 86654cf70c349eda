//! Foreman QA acceptance harness
//!
//! Wires the record layer and the hammer wrapper to a backend and hosts the
//! acceptance suites under `tests/`:
//!
//! ```text
//! Harness::offline()              Harness::live(SuiteConfig)
//!   ├── api()    -> MemorySession   ├── api()    -> HttpTransport
//!   └── hammer() -> SimulatedHammer └── hammer() -> LocalRunner (sh -c)
//! ```

pub mod error;
pub mod harness;
pub mod output;
pub mod sim;

pub use error::{E2eError, E2eResult};
pub use harness::{Api, Cli, Harness};
pub use output::OutputFormat;
pub use sim::SimulatedHammer;
