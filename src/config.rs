//! # Application Configuration
//!
//! [`AppConfig`] is read from a YAML or JSON file (chosen by extension) and
//! then overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `BOUNCE_PORT` | `server.port` |
//! | `BOUNCE_LOG_LEVEL` | `log.level` |
//! | `BOUNCE_LOG_FORMAT` | `log.format` |
//! | `BOUNCE_LOG_FILTER` | `log.target_filter` |
//! | `BOUNCE_HANDLER_TIMEOUT_MS` | `dispatch.handler_timeout_ms` |
//! | `BOUNCE_BLOCKING_WORKERS` | `blocking.workers` |
//! | `BOUNCE_PACKAGES` | `packages` (comma separated) |
//! | `BOUNCE_API_KEYS` | `security.api_keys` (comma separated) |
//!
//! ```yaml
//! server:
//!   port: 8080
//! log:
//!   level: debug
//!   format: pretty
//! dispatch:
//!   handler_timeout_ms: 5000
//! packages:
//!   - bounce::controllers
//!   - bounce::middleware
//! ```

use crate::error::ConfigError;
use crate::logging::LogConfig;
use crate::middleware::DEFAULT_API_KEY_HEADER;
use crate::worker_pool::{WorkerPoolConfig, DEFAULT_BLOCKING_WORKERS};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Default handler timeout.
pub const DEFAULT_HANDLER_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the embedding HTTP server should listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Timeout for routes that do not declare their own.
    pub handler_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            handler_timeout_ms: DEFAULT_HANDLER_TIMEOUT_MS,
        }
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingConfig {
    pub workers: usize,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_BLOCKING_WORKERS,
        }
    }
}

impl BlockingConfig {
    #[must_use]
    pub fn pool_config(&self) -> WorkerPoolConfig {
        WorkerPoolConfig::new(self.workers)
    }
}

/// Settings for the API-key guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub api_key_header: String,
    /// Accepted keys. With none configured every guarded request is rejected.
    pub api_keys: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            api_keys: Vec::new(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub dispatch: DispatchConfig,
    pub blocking: BlockingConfig,
    pub security: SecurityConfig,
    /// Package prefixes scanned for controllers and interceptors.
    pub packages: Vec<String>,
}

impl AppConfig {
    /// Read a configuration file. `.json` is parsed as JSON, anything else as
    /// YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let load_err = |reason: String| ConfigError::Load {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&text).map_err(|e| load_err(e.to_string()))
        } else {
            serde_yaml::from_str(&text).map_err(|e| load_err(e.to_string()))
        }
    }

    /// Read `path` if given, otherwise start from defaults; then apply the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply `BOUNCE_*` overrides. Unparsable numbers are ignored with a
    /// warning.
    pub fn apply_env(&mut self) {
        self.log.apply_env();
        if let Some(port) = parse_env("BOUNCE_PORT") {
            self.server.port = port;
        }
        if let Some(ms) = parse_env("BOUNCE_HANDLER_TIMEOUT_MS") {
            self.dispatch.handler_timeout_ms = ms;
        }
        if let Some(workers) = parse_env("BOUNCE_BLOCKING_WORKERS") {
            self.blocking.workers = workers;
        }
        if let Ok(packages) = env::var("BOUNCE_PACKAGES") {
            self.packages = split_list(&packages);
        }
        if let Ok(keys) = env::var("BOUNCE_API_KEYS") {
            self.security.api_keys = split_list(&keys);
        }
    }

    #[must_use]
    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packages = packages.into_iter().map(Into::into).collect();
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
