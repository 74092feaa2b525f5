//! Service configuration: TOML file, environment overrides and defaults.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::stats_service::DEFAULT_LIMIT;

/// Environment variable overriding [`ServiceConfig::database_path`].
pub const ENV_DATABASE: &str = "STRICTLY_ARBITER_DB";
/// Environment variable overriding [`ServiceConfig::engine_url`].
pub const ENV_ENGINE_URL: &str = "ENGINE_URL";
/// Environment variable overriding [`ServiceConfig::engine_timeout_ms`].
pub const ENV_ENGINE_TIMEOUT: &str = "ENGINE_TIMEOUT_MS";
/// Environment variable overriding [`ServiceConfig::port`].
pub const ENV_PORT: &str = "PORT";

/// Runtime configuration for the arbiter service.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ServiceConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Base URL of the decision engine.
    #[serde(default = "default_engine_url")]
    engine_url: String,

    /// Upper bound on each engine call, in milliseconds.
    #[serde(default = "default_engine_timeout_ms")]
    engine_timeout_ms: u64,

    /// Difficulty forwarded to the engine (`easy`, `medium` or `hard`).
    #[serde(default)]
    engine_difficulty: Option<String>,

    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Rows returned by list endpoints when the caller gives no limit.
    #[serde(default = "default_leaderboard_limit")]
    leaderboard_limit: i64,
}

#[instrument]
fn default_database_path() -> String {
    "strictly_arbiter.db".to_string()
}

#[instrument]
fn default_engine_url() -> String {
    "http://localhost:8000".to_string()
}

#[instrument]
fn default_engine_timeout_ms() -> u64 {
    5_000
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

#[instrument]
fn default_leaderboard_limit() -> i64 {
    DEFAULT_LIMIT
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            engine_url: default_engine_url(),
            engine_timeout_ms: default_engine_timeout_ms(),
            engine_difficulty: None,
            host: default_host(),
            port: default_port(),
            leaderboard_limit: default_leaderboard_limit(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Missing keys take their defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(engine_url = %config.engine_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if given, then applies environment overrides.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from a variable lookup such as [`std::env::var`].
    #[instrument(skip(self, lookup))]
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = lookup(ENV_DATABASE) {
            debug!(path = %path, "Database path from environment");
            self.database_path = path;
        }
        if let Some(url) = lookup(ENV_ENGINE_URL) {
            debug!(url = %url, "Engine URL from environment");
            self.engine_url = url;
        }
        if let Some(timeout) = lookup(ENV_ENGINE_TIMEOUT) {
            self.engine_timeout_ms = timeout.trim().parse().map_err(|_| {
                ConfigError::new(format!("{} must be a number, got '{}'", ENV_ENGINE_TIMEOUT, timeout))
            })?;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::new(format!("{} must be a port, got '{}'", ENV_PORT, port)))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Engine call timeout.
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }

    /// Socket address string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine_timeout_ms == 0 {
            return Err(ConfigError::new("engine_timeout_ms must be positive".to_string()));
        }
        if let Some(difficulty) = self
            .engine_difficulty
            .as_ref()
            .filter(|d| !matches!(d.as_str(), "easy" | "medium" | "hard"))
        {
            warn!(difficulty = %difficulty, "Unknown engine difficulty");
            return Err(ConfigError::new(format!(
                "engine_difficulty must be easy, medium or hard, got '{}'",
                difficulty
            )));
        }
        if self.leaderboard_limit < 1 {
            return Err(ConfigError::new("leaderboard_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
