//! Classified errors returned by every CRM API call.
//!
//! [`ApiError`] is created at the point a failure is first observed and is
//! never mutated afterwards. Layers that need to add information (the retry
//! coordinator noting an attempt count, the fallback caller attaching the
//! primary endpoint's failure) build a new value from the old one.
//!
//! # Propagation
//!
//! | Kind | Retried | Eligible for fallback |
//! |------|---------|-----------------------|
//! | [`ErrorKind::Timeout`] | no | yes |
//! | [`ErrorKind::Network`] | no | yes |
//! | [`ErrorKind::Http`] | no | yes |
//! | [`ErrorKind::Unknown`] | yes, up to the attempt ceiling | yes |
//! | [`ErrorKind::Config`] | no | no |
//!
//! ```
//! use crm_api_core::{ApiError, ErrorKind};
//!
//! let err = ApiError::http(503, "Service Unavailable", "http://localhost:8000/api/crm/leads/", "/api/crm/leads/");
//! assert_eq!(err.kind(), ErrorKind::Http);
//! assert_eq!(err.status(), Some(503));
//! assert_eq!(err.message(), "API Error: 503 Service Unavailable");
//! assert!(!err.is_retryable());
//! assert!(err.allows_fallback());
//! ```

use std::fmt;
use thiserror::Error;

/// Message used for every timeout failure.
pub const TIMEOUT_MESSAGE: &str = "Request timeout - server took too long to respond";

/// Message used for every unreachable-backend failure.
pub const NETWORK_MESSAGE: &str =
    "Network error - unable to connect to server. Check if backend is running.";

/// Category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No response within the attempt's timeout; the attempt was cancelled.
    Timeout,
    /// The backend could not be reached (connection refused, DNS failure).
    Network,
    /// The backend answered with a non-success status.
    Http,
    /// Any other local failure. The only retryable kind.
    Unknown,
    /// An endpoint lookup named a category or name absent from the catalog.
    Config,
}

impl ErrorKind {
    /// Upper-case wire name, e.g. `"TIMEOUT"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Network => "NETWORK",
            ErrorKind::Http => "HTTP",
            ErrorKind::Unknown => "UNKNOWN",
            ErrorKind::Config => "CONFIG",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and why a failure happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Full URL of the failed attempt.
    pub url: Option<String>,
    /// Path portion the caller asked for.
    pub endpoint: Option<String>,
    /// Underlying message before classification.
    pub raw_message: Option<String>,
    /// Attempts made before giving up, set once retries are exhausted.
    pub attempts: Option<usize>,
}

/// A classified failure.
///
/// `message` is always a non-empty, human-readable string suitable for
/// rendering directly to a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
    context: ErrorContext,
    primary_error: Option<Box<ApiError>>,
}

impl ApiError {
    fn build(kind: ErrorKind, message: String, status: Option<u16>, context: ErrorContext) -> Self {
        let message = if message.trim().is_empty() {
            format!("{kind} error")
        } else {
            message
        };
        Self {
            message,
            kind,
            status,
            context,
            primary_error: None,
        }
    }

    /// Attempt exceeded its timeout and was cancelled.
    pub fn timeout(url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::build(
            ErrorKind::Timeout,
            TIMEOUT_MESSAGE.to_string(),
            None,
            ErrorContext {
                url: Some(url.into()),
                endpoint: Some(endpoint.into()),
                ..ErrorContext::default()
            },
        )
    }

    /// Backend unreachable.
    pub fn network(
        url: impl Into<String>,
        endpoint: impl Into<String>,
        raw_message: impl Into<String>,
    ) -> Self {
        Self::build(
            ErrorKind::Network,
            NETWORK_MESSAGE.to_string(),
            None,
            ErrorContext {
                url: Some(url.into()),
                endpoint: Some(endpoint.into()),
                raw_message: Some(raw_message.into()),
                attempts: None,
            },
        )
    }

    /// Backend answered with `status`; `reason` is the server-provided message
    /// or the status text.
    pub fn http(
        status: u16,
        reason: impl Into<String>,
        url: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let mut reason = reason.into();
        if reason.trim().is_empty() {
            reason = format!("HTTP {status}");
        }
        Self::build(
            ErrorKind::Http,
            format!("API Error: {status} {reason}"),
            Some(status),
            ErrorContext {
                url: Some(url.into()),
                endpoint: Some(endpoint.into()),
                raw_message: Some(reason),
                attempts: None,
            },
        )
    }

    /// Unexpected local failure.
    pub fn unknown(
        raw_message: impl Into<String>,
        url: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let raw = raw_message.into();
        Self::build(
            ErrorKind::Unknown,
            raw.clone(),
            None,
            ErrorContext {
                url: Some(url.into()),
                endpoint: Some(endpoint.into()),
                raw_message: Some(raw),
                attempts: None,
            },
        )
    }

    /// Misconfigured endpoint lookup. A programmer error, never transient.
    pub fn config(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::build(
            ErrorKind::Config,
            message.clone(),
            None,
            ErrorContext {
                raw_message: Some(message),
                ..ErrorContext::default()
            },
        )
    }

    /// Re-wraps the last failure of an exhausted retry loop as UNKNOWN with the
    /// attempt count in both the message and the context.
    pub fn exhausted(&self, attempts: usize) -> Self {
        let raw = self
            .context
            .raw_message
            .clone()
            .unwrap_or_else(|| self.message.clone());
        let mut context = self.context.clone();
        context.attempts = Some(attempts);
        let noun = if attempts == 1 { "attempt" } else { "attempts" };
        Self::build(
            ErrorKind::Unknown,
            format!("Failed to connect to server: {raw} (after {attempts} {noun})"),
            self.status,
            context,
        )
    }

    /// Returns a copy of this error that also carries the failure of the
    /// primary endpoint that preceded it.
    pub fn with_primary(&self, primary: ApiError) -> Self {
        let mut err = self.clone();
        err.primary_error = Some(Box::new(primary));
        err
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Location and raw cause.
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Failure of the primary endpoint when this error came from a fallback.
    pub fn primary_error(&self) -> Option<&ApiError> {
        self.primary_error.as_deref()
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    pub fn is_http(&self) -> bool {
        self.kind == ErrorKind::Http
    }

    pub fn is_unknown(&self) -> bool {
        self.kind == ErrorKind::Unknown
    }

    pub fn is_config(&self) -> bool {
        self.kind == ErrorKind::Config
    }

    /// Only UNKNOWN failures are retried.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Unknown
    }

    /// Everything except CONFIG may be answered by a fallback endpoint.
    pub fn allows_fallback(&self) -> bool {
        self.kind != ErrorKind::Config
    }
}
