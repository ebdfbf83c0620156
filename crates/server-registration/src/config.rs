//! Configuration for the registration tool.

use anyhow::{Context, Result};
use page_client::RetryBudget;
use serde::Deserialize;
use std::time::Duration;

/// Account service the server registers against.
pub const DEFAULT_REGISTRATION_HOST: &str = "https://account.jetbrains.com";

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from `REGISTER_*` environment variables
    /// (e.g. `REGISTER_LOG__LEVEL=debug`, `REGISTER_HTTP__TIMEOUT=10s`).
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("REGISTER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

/// Settings the flow is constructed with.
///
/// Not exposed on the command line; tests pass their own values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
    /// Base URL of the account service
    pub registration_host: String,

    /// Budget for waiting on the server and polling the confirmation
    pub retry: RetryBudget,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            registration_host: DEFAULT_REGISTRATION_HOST.into(),
            retry: RetryBudget::default(),
        }
    }
}
