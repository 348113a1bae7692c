//! Configuration management for fanout
//!
//! This module handles loading and validating configuration from a TOML
//! file and environment variables. Configuration is built once at start and
//! never mutated; changing it requires a restart.
//!
//! # Environment
//!
//! | Variable                   | Field                          |
//! |----------------------------|--------------------------------|
//! | `FANOUT_ENDPOINTS`         | `endpoints` (`kw=addr,kw=addr`)|
//! | `FANOUT_NOTIFICATION_URL`  | `notification.address`         |
//! | `FANOUT_MAX_RETRIES`       | `warmup.max_retries`           |
//! | `FANOUT_INITIAL_DELAY_MS`  | `warmup.initial_delay_ms`      |
//! | `FANOUT_MAX_DELAY_MS`      | `warmup.max_delay_ms`          |
//! | `FANOUT_JITTER`            | `warmup.jitter`                |
//! | `FANOUT_PROBE_TIMEOUT`     | `warmup.probe_timeout_secs`    |
//! | `FANOUT_WARMUP_DEADLINE`   | `warmup.deadline_secs`         |
//! | `FANOUT_DISPATCH_TIMEOUT`  | `dispatch.timeout_secs`        |
//! | `FANOUT_CONCURRENCY`       | `dispatch.concurrency`         |
//! | `FANOUT_GATE`              | `dispatch.gate`                |
//! | `FANOUT_MATCH_STRATEGY`    | `dispatch.match_strategy`      |
//! | `FANOUT_DUPLICATE_POLICY`  | `dispatch.duplicate_policy`    |
//! | `FANOUT_BIND`              | `server.bind_address`          |
//! | `FANOUT_LOG_LEVEL`         | `logging.level`                |
//! | `FANOUT_LOG_FORMAT`        | `logging.format`               |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::dispatch::GateMode;
use crate::error::{Error, Result};
use crate::extract::DuplicatePolicy;
use crate::models::Endpoint;
use crate::routing::MatchStrategy;
use crate::warmup::BackoffPolicy;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scraper services in routing order
    pub endpoints: Vec<EndpointConfig>,

    /// Downstream notification service
    pub notification: NotificationConfig,

    /// Warm-up retry configuration
    pub warmup: WarmupConfig,

    /// Dispatch configuration
    pub dispatch: DispatchConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// One routing keyword and the service that handles it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Domain fragment matched against URLs
    pub keyword: String,

    /// Base address of the scraper service
    pub address: String,
}

impl From<&EndpointConfig> for Endpoint {
    fn from(config: &EndpointConfig) -> Self {
        Endpoint::new(config.keyword.clone(), config.address.clone())
    }
}

/// Notification service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Base address; notifications go to `<address>/send-notifications`
    pub address: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Warm-up retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    /// Probes per endpoint, including the first
    pub max_retries: u32,

    /// Delay after the first transient failure in milliseconds
    pub initial_delay_ms: u64,

    /// Backoff growth factor
    pub multiplier: f64,

    /// Cap on a single delay in milliseconds (none by default)
    pub max_delay_ms: Option<u64>,

    /// Random spread as a fraction of each delay, in [0, 1)
    pub jitter: f64,

    /// Probe timeout in seconds
    pub probe_timeout_secs: u64,

    /// Time budget for one endpoint's warm-up in seconds (none by default)
    pub deadline_secs: Option<u64>,
}

/// Dispatch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Submission timeout in seconds
    pub timeout_secs: u64,

    /// Maximum concurrent submissions
    pub concurrency: usize,

    /// When dispatch may start relative to warm-up
    pub gate: GateMode,

    /// Fixed wait used by the legacy gate, in seconds
    pub legacy_wait_secs: u64,

    /// How route keywords are matched against URLs
    pub match_strategy: MatchStrategy,

    /// How cosmetically different URLs are treated
    pub duplicate_policy: DuplicatePolicy,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Enable CORS for the API
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: vec![
                EndpointConfig {
                    keyword: String::from("fresheropenings.com"),
                    address: String::from("https://job-scraper-backend-1.onrender.com"),
                },
                EndpointConfig {
                    keyword: String::from("fresherscareers.com"),
                    address: String::from("https://job-scraper-2.onrender.com"),
                },
                EndpointConfig {
                    keyword: String::from("fresherscamp.com"),
                    address: String::from("https://job-scraper-3.onrender.com"),
                },
            ],
            notification: NotificationConfig::default(),
            warmup: WarmupConfig::default(),
            dispatch: DispatchConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            address: String::from("http://127.0.0.1:5001"),
            timeout_secs: 15,
        }
    }
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 3_000,
            multiplier: 2.0,
            max_delay_ms: None,
            jitter: 0.0,
            probe_timeout_secs: 10,
            deadline_secs: None,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            concurrency: 4,
            gate: GateMode::default(),
            legacy_wait_secs: 60,
            match_strategy: MatchStrategy::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl WarmupConfig {
    /// Backoff policy described by this section
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            multiplier: self.multiplier,
            max_delay: self.max_delay_ms.map(Duration::from_millis),
            jitter: self.jitter,
        }
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn legacy_wait(&self) -> Duration {
        Duration::from_secs(self.legacy_wait_secs)
    }
}

impl NotificationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// File (if given) then environment overrides, validated
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Overlay `FANOUT_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var("FANOUT_ENDPOINTS") {
            self.endpoints = parse_endpoint_list(&raw)?;
        }

        if let Ok(address) = std::env::var("FANOUT_NOTIFICATION_URL") {
            self.notification.address = address;
        }

        if let Some(v) = env_parse("FANOUT_MAX_RETRIES") {
            self.warmup.max_retries = v;
        }
        if let Some(v) = env_parse("FANOUT_INITIAL_DELAY_MS") {
            self.warmup.initial_delay_ms = v;
        }
        if let Some(v) = env_parse("FANOUT_MAX_DELAY_MS") {
            self.warmup.max_delay_ms = Some(v);
        }
        if let Some(v) = env_parse("FANOUT_JITTER") {
            self.warmup.jitter = v;
        }
        if let Some(v) = env_parse("FANOUT_PROBE_TIMEOUT") {
            self.warmup.probe_timeout_secs = v;
        }
        if let Some(v) = env_parse("FANOUT_WARMUP_DEADLINE") {
            self.warmup.deadline_secs = Some(v);
        }

        if let Some(v) = env_parse("FANOUT_DISPATCH_TIMEOUT") {
            self.dispatch.timeout_secs = v;
        }
        if let Some(v) = env_parse("FANOUT_CONCURRENCY") {
            self.dispatch.concurrency = v;
        }
        if let Some(v) = env_parse("FANOUT_GATE") {
            self.dispatch.gate = v;
        }
        if let Some(v) = env_parse("FANOUT_MATCH_STRATEGY") {
            self.dispatch.match_strategy = v;
        }
        if let Some(v) = env_parse("FANOUT_DUPLICATE_POLICY") {
            self.dispatch.duplicate_policy = v;
        }

        if let Some(v) = env_parse("FANOUT_BIND") {
            self.server.bind_address = v;
        }

        if let Ok(level) = std::env::var("FANOUT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("FANOUT_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(Error::config("at least one endpoint must be configured"));
        }

        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            if endpoint.keyword.trim().is_empty() {
                return Err(Error::config("endpoint keyword cannot be empty"));
            }
            if !seen.insert(endpoint.keyword.as_str()) {
                return Err(Error::config(format!(
                    "duplicate endpoint keyword: {}",
                    endpoint.keyword
                )));
            }
            if endpoint.keyword == crate::notify::SERVICE_NAME {
                return Err(Error::config(format!(
                    "endpoint keyword '{}' is reserved",
                    endpoint.keyword
                )));
            }
            validate_address(&endpoint.address)?;
        }

        validate_address(&self.notification.address)?;

        if self.warmup.max_retries == 0 {
            return Err(Error::config("max_retries must be greater than 0"));
        }
        if self.warmup.multiplier < 1.0 {
            return Err(Error::config("multiplier must be at least 1.0"));
        }
        if !(0.0..1.0).contains(&self.warmup.jitter) {
            return Err(Error::config("jitter must be in [0, 1)"));
        }
        if self.warmup.probe_timeout_secs == 0
            || self.dispatch.timeout_secs == 0
            || self.notification.timeout_secs == 0
        {
            return Err(Error::config("timeouts must be greater than 0"));
        }
        if self.dispatch.concurrency == 0 {
            return Err(Error::config("concurrency must be greater than 0"));
        }

        Ok(())
    }

    /// Configured scraper endpoints in routing order
    pub fn endpoint_list(&self) -> Vec<Endpoint> {
        self.endpoints.iter().map(Endpoint::from).collect()
    }
}

/// Parse `keyword=address,keyword=address`, keeping order
pub fn parse_endpoint_list(raw: &str) -> Result<Vec<EndpointConfig>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (keyword, address) = pair.split_once('=').ok_or_else(|| {
                Error::config(format!("expected keyword=address, got '{pair}'"))
            })?;
            Ok(EndpointConfig {
                keyword: keyword.trim().to_string(),
                address: address.trim().to_string(),
            })
        })
        .collect()
}

fn validate_address(address: &str) -> Result<()> {
    if !address.starts_with("http://") && !address.starts_with("https://") {
        return Err(Error::config(format!(
            "address must start with http:// or https://: {address}"
        )));
    }
    Ok(())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring invalid environment value");
            None
        }
    }
}
