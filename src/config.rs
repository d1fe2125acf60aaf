//! Environment-backed API configuration.

use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::query::QueryConfig;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_API_PREFIX: &str = "/api/v1";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Cache retention presets used by the endpoint catalog.
pub mod cache_time {
    use std::time::Duration;

    pub const SHORT: Duration = Duration::from_secs(5 * 60);
    pub const MEDIUM: Duration = Duration::from_secs(15 * 60);
    pub const LONG: Duration = Duration::from_secs(60 * 60);
}

/// Deployment environment. Controls retry budget and request logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Interactive development: fewer retries, request errors logged.
    Development,
    #[default]
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Request errors are logged at `error` level only in development.
    #[must_use]
    pub const fn logs_request_errors(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

/// Error produced while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration for the API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Scheme, host and port, without a trailing slash.
    pub base_url: String,
    /// Versioned path prefix, e.g. `/api/v1`.
    pub api_prefix: String,
    pub environment: Environment,
    /// Per-request wall-clock timeout.
    pub timeout: Duration,
    pub retry_base_delay: Duration,
    /// Total attempts per request, including the first.
    pub retry_max_attempts: u32,
    pub query: QueryConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl ApiConfig {
    /// Defaults for the given environment.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        let retry = crate::retry::RetryPolicy::for_environment(environment);
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            environment,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            retry_max_attempts: retry.max_attempts(),
            query: QueryConfig::default(),
        }
    }

    /// The root all request paths are appended to.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/')
        )
    }

    /// Parse configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `PAWHUB_API_URL` | `http://localhost:8000` |
    /// | `PAWHUB_API_PREFIX` | `/api/v1` |
    /// | `PAWHUB_ENV` | `production` |
    /// | `PAWHUB_TIMEOUT_MS` | `30000` |
    /// | `PAWHUB_RETRY_BASE_DELAY_MS` | `1000` |
    /// | `PAWHUB_RETRY_MAX_ATTEMPTS` | 2 in development, 4 in production |
    /// | `PAWHUB_STALE_TIME_MS` | unbounded (fresh until invalidated) |
    /// | `PAWHUB_CACHE_TIME_MS` | `300000` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparsable or out-of-range values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparsable or out-of-range values.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let environment = match optional_trimmed("PAWHUB_ENV", &mut lookup) {
            Some(value) => Environment::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                key: "PAWHUB_ENV",
                value,
                reason: "expected development or production".to_owned(),
            })?,
            None => Environment::default(),
        };

        let mut config = Self::for_environment(environment);

        if let Some(base_url) = optional_trimmed("PAWHUB_API_URL", &mut lookup) {
            if let Err(e) = url::Url::parse(&base_url) {
                return Err(ConfigError::InvalidValue {
                    key: "PAWHUB_API_URL",
                    value: base_url,
                    reason: e.to_string(),
                });
            }
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(prefix) = optional_trimmed("PAWHUB_API_PREFIX", &mut lookup) {
            config.api_prefix = prefix;
        }

        if let Some(ms) = parse_optional_u64("PAWHUB_TIMEOUT_MS", &mut lookup)? {
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "PAWHUB_TIMEOUT_MS",
                    value: "0".to_owned(),
                    reason: "must be at least 1".to_owned(),
                });
            }
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_optional_u64("PAWHUB_RETRY_BASE_DELAY_MS", &mut lookup)? {
            config.retry_base_delay = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse_optional_u64("PAWHUB_RETRY_MAX_ATTEMPTS", &mut lookup)? {
            config.retry_max_attempts = u32::try_from(attempts)
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "PAWHUB_RETRY_MAX_ATTEMPTS",
                    value: attempts.to_string(),
                    reason: "must be between 1 and u32::MAX".to_owned(),
                })?;
        }
        if let Some(ms) = parse_optional_u64("PAWHUB_STALE_TIME_MS", &mut lookup)? {
            config.query.stale_time = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_optional_u64("PAWHUB_CACHE_TIME_MS", &mut lookup)? {
            config.query.cache_time = Duration::from_millis(ms);
        }

        Ok(config)
    }
}

fn optional_trimmed<F>(key: &str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_optional_u64<F>(key: &'static str, lookup: &mut F) -> Result<Option<u64>, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    optional_trimmed(key, lookup)
        .map(|value| {
            value.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key,
                value,
                reason: e.to_string(),
            })
        })
        .transpose()
}
