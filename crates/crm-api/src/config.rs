//! Client settings, from code or from the environment.

use crm_api_executor::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crm_api_retry::{DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const ENV_BASE_URL: &str = "CRM_API_URL";
pub const ENV_TIMEOUT_MS: &str = "CRM_API_TIMEOUT_MS";
pub const ENV_RETRY_ATTEMPTS: &str = "CRM_API_RETRY_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "CRM_API_RETRY_DELAY_MS";

/// Invalid client settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable held something other than a number.
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    /// The base URL is not an http(s) URL.
    #[error("invalid base URL {0:?}: expected an http:// or https:// URL")]
    InvalidBaseUrl(String),

    /// A zero timeout would fail every request before it is sent.
    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,
}

/// Settings for [`ApiClient`](crate::ApiClient).
///
/// Every field has a default, so a partial document deserializes:
///
/// ```
/// use crm_api::ApiClientConfig;
///
/// let config: ApiClientConfig = serde_json::from_str(r#"{"timeout_ms": 2500}"#).unwrap();
/// assert_eq!(config.base_url, "http://localhost:8000");
/// assert_eq!(config.timeout_ms, 2500);
/// assert_eq!(config.retry_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_attempts: usize,
    pub retry_delay_ms: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            retry_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: DEFAULT_DELAY.as_millis() as u64,
        }
    }
}

impl ApiClientConfig {
    /// Reads `CRM_API_URL`, `CRM_API_TIMEOUT_MS`, `CRM_API_RETRY_ATTEMPTS` and
    /// `CRM_API_RETRY_DELAY_MS`; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(ms) = number(&lookup, ENV_TIMEOUT_MS)? {
            config.timeout_ms = ms;
        }
        if let Some(attempts) = number(&lookup, ENV_RETRY_ATTEMPTS)? {
            config.retry_attempts = attempts as usize;
        }
        if let Some(ms) = number(&lookup, ENV_RETRY_DELAY_MS)? {
            config.retry_delay_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        crm_api_executor::validate_base_url(&self.base_url)
            .map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn number<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}
