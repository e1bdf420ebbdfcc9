//! Client configuration.
//!
//! # Responsibility
//! - Describe how to reach the note service and where to write logs.
//! - Load that description from `NOTEPANEL_*` environment variables.
//!
//! # Invariants
//! - `base_url` is an absolute `http`/`https` URL without trailing slash.
//! - `request_timeout == None` means requests never time out.

use crate::logging::default_log_level;
use reqwest::Url;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "NOTEPANEL_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "NOTEPANEL_API_TOKEN";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "NOTEPANEL_REQUEST_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "NOTEPANEL_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "NOTEPANEL_LOG_DIR";

/// Configuration failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    Missing(&'static str),
    /// A variable is set but cannot be used.
    Invalid { key: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting `{key}`"),
            Self::Invalid { key, reason } => write!(f, "invalid setting `{key}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings for the HTTP note service client and log bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer credential. `None` sends unauthenticated requests.
    pub api_token: Option<String>,
    pub request_timeout: Option<Duration>,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Creates a config for the given service root with defaults elsewhere.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            api_token: None,
            request_timeout: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        })
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.api_token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = read(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?;
        let mut config = Self::new(&base_url)?;

        if let Some(token) = read(ENV_API_TOKEN) {
            config = config.with_api_token(token);
        }
        if let Some(raw) = read(ENV_REQUEST_TIMEOUT_SECS) {
            config = config.with_request_timeout(parse_timeout_secs(&raw)?);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config = config.with_log_level(level);
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config = config.with_log_dir(dir);
        }

        Ok(config)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|err| ConfigError::Invalid {
        key: ENV_BASE_URL,
        reason: format!("`{trimmed}` is not an absolute URL: {err}"),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ConfigError::Invalid {
            key: ENV_BASE_URL,
            reason: format!("unsupported scheme `{other}`; expected http|https"),
        }),
    }
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Invalid {
            key: ENV_REQUEST_TIMEOUT_SECS,
            reason: format!("expected a positive integer, got `{raw}`"),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}
