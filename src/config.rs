//! Configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. API keys and secrets are never
//! read from the file: `<NAME>_API_KEY` and `<NAME>_API_SECRET` environment
//! variables (for example `KRAKEN_API_KEY`) fill them in after parsing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ConfigError, Result};
use crate::exchange::{Credentials, ExchangeKind, SourceMode};

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

/// Outbound network settings shared by every adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Plain-text endpoint that echoes the caller's IP.
    #[serde(default = "default_ip_echo_url")]
    pub ip_echo_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ip_echo_url() -> String {
    "https://api.ipify.org".into()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl NetworkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ip_echo_url: default_ip_echo_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One `[[exchanges]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    pub name: ExchangeKind,
    #[serde(default)]
    pub source: SourceMode,
    /// Overrides the adapter's default API base URL.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Reference snapshot seeding coins and pairs; required for `json_file`.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    /// Loaded from the environment at runtime, never from the config file.
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub exchanges: Vec<ExchangeConfig>,
}

impl Config {
    /// Read, parse and validate a config file, then pull credentials from
    /// the process environment.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse_toml(&content)?;
        config.apply_credentials(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse and validate TOML content. Credentials are left unset.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Fill each exchange's credentials from `lookup`, keyed by
    /// `<NAME>_API_KEY` / `<NAME>_API_SECRET`. Entries with either part
    /// missing or empty stay without credentials.
    pub fn apply_credentials<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for exchange in &mut self.exchanges {
            let prefix = exchange.name.as_str().to_ascii_uppercase();
            exchange.credentials = Credentials::from_parts(
                lookup(&format!("{prefix}_API_KEY")),
                lookup(&format!("{prefix}_API_SECRET")),
            );
        }
    }

    #[must_use]
    pub fn exchange(&self, kind: ExchangeKind) -> Option<&ExchangeConfig> {
        self.exchanges.iter().find(|e| e.name == kind)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "logging.level" }.into());
        }
        if self.exchanges.is_empty() {
            return Err(ConfigError::MissingField { field: "exchanges" }.into());
        }
        if self.network.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.timeout_secs",
                reason: "must be greater than zero".into(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for exchange in &self.exchanges {
            if !seen.insert(exchange.name) {
                return Err(ConfigError::InvalidValue {
                    field: "exchanges.name",
                    reason: format!("{} is configured more than once", exchange.name),
                }
                .into());
            }
            if exchange.source == SourceMode::JsonFile && exchange.snapshot.is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "exchanges.snapshot",
                    reason: format!("{} uses json_file but has no snapshot", exchange.name),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Install the global `tracing` subscriber. `RUST_LOG` wins over
    /// `logging.level`.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));
        // Command output owns stdout.
        let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

        let installed = match self.logging.format.as_str() {
            "json" => builder.json().try_init(),
            _ => builder.try_init(),
        };
        if installed.is_err() {
            tracing::debug!("Subscriber already installed, keeping it");
        }
    }
}
