//! Wiring for acceptance scenarios
//!
//! A [`Harness`] hands out the API binding and the hammer wrapper for one
//! backend: the in-memory server with a simulated hammer, or a live server
//! reached over HTTP with the real hammer.

use std::sync::Arc;

use foreman_qa_cli::{CommandRunner, Hammer, LocalRunner};
use foreman_qa_common::{
    CliConfig, HttpTransport, MemoryServer, Poll, Request, SuiteConfig, Transport,
};
use foreman_qa_records::ApiCrud;
use tracing::info;

use crate::error::{E2eError, E2eResult};
use crate::sim::SimulatedHammer;

/// API binding over whichever backend the harness runs against
pub type Api = ApiCrud<Box<dyn Transport>>;

/// Hammer wrapper over whichever runner the harness uses
pub type Cli = Hammer<Arc<dyn CommandRunner>>;

enum Backend {
    Offline(Arc<MemoryServer>),
    Live(HttpTransport),
}

pub struct Harness {
    backend: Backend,
    config: SuiteConfig,
}

impl Harness {
    /// Fresh in-memory server, simulated hammer and short polls
    pub fn offline() -> Self {
        let mut config = SuiteConfig::default();
        config.wait.poll_interval_ms = 5;
        config.wait.report_timeout_secs = 5;

        Self {
            backend: Backend::Offline(MemoryServer::new()),
            config,
        }
    }

    /// Live server from `config`
    pub fn live(config: SuiteConfig) -> E2eResult<Self> {
        let transport = HttpTransport::new(&config.server)?;
        info!("Running against {}", config.server.url);
        Ok(Self {
            backend: Backend::Live(transport),
            config,
        })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// The in-memory server, when running offline
    pub fn server(&self) -> Option<&Arc<MemoryServer>> {
        match &self.backend {
            Backend::Offline(server) => Some(server),
            Backend::Live(_) => None,
        }
    }

    /// API binding acting as the configured account
    pub fn api(&self) -> Api {
        let server = &self.config.server;
        self.api_as(&server.username, &server.password)
    }

    /// API binding acting as another account
    pub fn api_as(&self, login: &str, password: &str) -> Api {
        let transport: Box<dyn Transport> = match &self.backend {
            Backend::Offline(server) => Box::new(server.session(login)),
            Backend::Live(transport) => Box::new(transport.with_credentials(login, password)),
        };
        ApiCrud::new(transport)
    }

    /// Hammer wrapper acting as the configured account
    pub fn hammer(&self) -> Cli {
        match &self.backend {
            Backend::Offline(server) => {
                let runner: Arc<dyn CommandRunner> = Arc::new(SimulatedHammer::new(Arc::clone(server)));
                Hammer::new(runner, &CliConfig::default(), &self.config.server)
            }
            Backend::Live(_) => {
                let runner: Arc<dyn CommandRunner> = Arc::new(LocalRunner);
                Hammer::new(runner, &self.config.cli, &self.config.server)
            }
        }
    }

    /// Polling for scheduled reports
    pub fn poll(&self) -> Poll {
        self.config.wait.report_poll()
    }

    /// Ask the server for `/api/status`
    pub fn status(&self) -> E2eResult<String> {
        let response = self.api().transport().send(Request::get("/api/status"))?;
        if !response.is_success() {
            return Err(E2eError::Status(format!(
                "{} answered {}: {}",
                self.config.server.url,
                response.status,
                response.error_message()
            )));
        }
        Ok(response.body.to_string())
    }
}
