//! Suite configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::wait::Poll;

/// Top-level configuration for a test run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Server under test
    pub server: ServerConfig,

    /// Command-line client settings
    pub cli: CliConfig,

    /// Polling behaviour for asynchronous server jobs
    pub wait: WaitConfig,
}

/// Connection settings for the remote API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL, e.g. https://foreman.example.com
    pub url: String,

    /// Login used for API and CLI calls
    pub username: String,

    /// Password for `username`
    pub password: String,

    /// Verify the server's TLS certificate
    pub verify_ssl: bool,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost".to_string(),
            username: "admin".to_string(),
            password: "changeme".to_string(),
            verify_ssl: false,
            timeout_secs: 60,
        }
    }
}

/// Settings for the `hammer` command-line client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Command prefix used to invoke hammer (may include an ssh wrapper)
    pub hammer_command: String,

    /// Output format requested for structured commands
    pub output: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            hammer_command: "hammer".to_string(),
            output: "json".to_string(),
        }
    }
}

/// Bounded polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub poll_interval_ms: u64,
    pub report_timeout_secs: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            report_timeout_secs: 300,
        }
    }
}

impl WaitConfig {
    pub fn report_poll(&self) -> Poll {
        Poll::new(
            Duration::from_secs(self.report_timeout_secs),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}

impl SuiteConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `FOREMAN_QA_*` environment overrides
    pub fn apply_env(mut self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("FOREMAN_QA_URL") {
            self.server.url = url;
        }
        if let Some(username) = lookup("FOREMAN_QA_USERNAME") {
            self.server.username = username;
        }
        if let Some(password) = lookup("FOREMAN_QA_PASSWORD") {
            self.server.password = password;
        }
        if let Some(verify) = lookup("FOREMAN_QA_VERIFY_SSL") {
            self.server.verify_ssl = match verify.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(Error::InvalidConfig(format!(
                        "FOREMAN_QA_VERIFY_SSL must be a boolean, got '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(hammer) = lookup("FOREMAN_QA_HAMMER") {
            self.cli.hammer_command = hammer;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if !self.server.url.starts_with("http://") && !self.server.url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "server.url must be an http(s) URL, got '{}'",
                self.server.url
            )));
        }
        if self.server.username.is_empty() {
            return Err(Error::InvalidConfig("server.username is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SuiteConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.username, "admin");
        assert_eq!(config.cli.hammer_command, "hammer");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/suite.toml");

        let mut config = SuiteConfig::default();
        config.server.url = "https://sat.example.com".to_string();
        config.wait.poll_interval_ms = 250;
        config.save(&path).unwrap();

        let loaded = SuiteConfig::load(&path).unwrap();
        assert_eq!(loaded.server.url, "https://sat.example.com");
        assert_eq!(loaded.wait.poll_interval_ms, 250);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.toml");
        std::fs::write(&path, "[server]\nurl = \"http://10.0.0.5\"\n").unwrap();

        let loaded = SuiteConfig::load(&path).unwrap();
        assert_eq!(loaded.server.url, "http://10.0.0.5");
        assert_eq!(loaded.server.password, "changeme");
        assert_eq!(loaded.wait.report_timeout_secs, 300);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FOREMAN_QA_URL", "https://override.example.com"),
            ("FOREMAN_QA_VERIFY_SSL", "yes"),
            ("FOREMAN_QA_HAMMER", "ssh root@sat hammer"),
        ]
        .into_iter()
        .collect();

        let mut config = SuiteConfig::default();
        config
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.url, "https://override.example.com");
        assert!(config.server.verify_ssl);
        assert_eq!(config.cli.hammer_command, "ssh root@sat hammer");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = SuiteConfig::default();
        let err = config
            .apply_vars(|key| (key == "FOREMAN_QA_URL").then(|| "ftp://nope".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
