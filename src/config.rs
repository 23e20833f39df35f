//! Client configuration.
//!
//! Sources in increasing priority: built-in defaults, an optional TOML file,
//! the environment (after `.env` is loaded), then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::ConfigError;
use crate::session::RematchPolicy;

/// Environment variable naming the authority endpoint.
pub const ENDPOINT_ENV: &str = "STRICTLY_ONLINE_URL";

/// How a rematch request is sequenced, as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RematchMode {
    /// Wait for the authority's reset acknowledgement.
    #[default]
    AwaitReset,
    /// Wait a fixed delay.
    Delay,
}

/// Configuration for the online client.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the authority.
    #[serde(default = "default_endpoint")]
    endpoint: String,

    /// Rematch sequencing.
    #[serde(default)]
    rematch: RematchMode,

    /// Delay between `playAgain` and `request_to_play` in delay mode.
    #[serde(default = "default_rematch_delay_ms")]
    rematch_delay_ms: u64,

    /// Log file used while the terminal UI owns the screen.
    #[serde(default = "default_log_file")]
    log_file: PathBuf,
}

fn default_endpoint() -> String {
    "ws://localhost:3000/ws".to_string()
}

fn default_rematch_delay_ms() -> u64 {
    100
}

fn default_log_file() -> PathBuf {
    PathBuf::from("strictly_online.log")
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            rematch: RematchMode::default(),
            rematch_delay_ms: default_rematch_delay_ms(),
            log_file: default_log_file(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(endpoint = %config.endpoint, "Config loaded successfully");
        Ok(config)
    }

    /// Defaults, then `path` if given, then the process environment.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` (an environment-like key lookup).
    #[instrument(skip(self, lookup))]
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(endpoint = %endpoint, "Endpoint overridden from environment");
            self.endpoint = endpoint.trim().to_string();
        }
        self.validate()?;
        Ok(self)
    }

    /// Replaces the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        self.endpoint = endpoint.into();
        self.validate()?;
        Ok(self)
    }

    /// Replaces the rematch sequencing.
    pub fn with_rematch(mut self, mode: RematchMode, delay_ms: u64) -> Self {
        self.rematch = mode;
        self.rematch_delay_ms = delay_ms;
        self
    }

    /// Session-level rematch policy.
    pub fn rematch_policy(&self) -> RematchPolicy {
        match self.rematch {
            RematchMode::AwaitReset => RematchPolicy::AwaitReset,
            RematchMode::Delay => RematchPolicy::Delay(Duration::from_millis(self.rematch_delay_ms)),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(ConfigError::new(format!(
                "endpoint must be a ws:// or wss:// URL, got {:?}",
                self.endpoint
            )));
        }
        Ok(())
    }
}
