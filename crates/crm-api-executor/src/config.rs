//! Configuration for the request executor.

use crate::events::ExecutorEvent;
use crate::request::Method;
use crate::token::{NoToken, StaticToken, TokenProvider};
use crm_api_core::events::{EventListeners, FnListener};
use crm_api_core::{ApiError, ErrorKind};
use std::sync::Arc;
use std::time::Duration;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default backend location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for [`RequestExecutor`](crate::RequestExecutor).
pub struct ExecutorConfig {
    pub(crate) base_url: String,
    pub(crate) default_timeout: Duration,
    pub(crate) token_provider: Arc<dyn TokenProvider>,
    pub(crate) event_listeners: EventListeners<ExecutorEvent>,
    pub(crate) name: String,
}

impl ExecutorConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`ExecutorConfig`].
pub struct ExecutorConfigBuilder {
    base_url: String,
    default_timeout: Duration,
    token_provider: Arc<dyn TokenProvider>,
    event_listeners: EventListeners<ExecutorEvent>,
    name: String,
}

impl ExecutorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_timeout: DEFAULT_TIMEOUT,
            token_provider: Arc::new(NoToken),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the base URL every request path is joined onto.
    ///
    /// Default: `http://localhost:8000`
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the timeout used when a request carries none of its own.
    ///
    /// Default: 10 seconds
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Sets where bearer tokens come from.
    ///
    /// Default: no token
    pub fn token_provider<P>(mut self, provider: P) -> Self
    where
        P: TokenProvider + 'static,
    {
        self.token_provider = Arc::new(provider);
        self
    }

    /// Shorthand for a fixed bearer token.
    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.token_provider(StaticToken::new(token))
    }

    /// Sets the name used in events and log lines.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Called before each transport attempt with method, URL and attempt number.
    pub fn on_attempt<F>(mut self, f: F) -> Self
    where
        F: Fn(Method, &str, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::AttemptStarted {
                method,
                url,
                attempt,
                ..
            } = event
            {
                f(*method, url.as_str(), *attempt);
            }
        }));
        self
    }

    /// Called with the HTTP status whenever the backend answers.
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(u16) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::Response { status, .. } = event {
                f(*status);
            }
        }));
        self
    }

    /// Called with the classified kind whenever an attempt fails.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(ErrorKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ExecutorEvent::Failed { kind, .. } = event {
                f(*kind);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build_config(self) -> ExecutorConfig {
        ExecutorConfig {
            base_url: self.base_url,
            default_timeout: self.default_timeout,
            token_provider: self.token_provider,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds a layer that wraps a transport into a [`RequestExecutor`](crate::RequestExecutor).
    pub fn build(self) -> crate::ExecutorLayer {
        crate::ExecutorLayer::new(self.build_config())
    }
}

impl Default for ExecutorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects base URLs the transport could never use.
pub fn validate_base_url(base_url: &str) -> Result<(), ApiError> {
    if base_url.starts_with("http://") || base_url.starts_with("https://") {
        Ok(())
    } else {
        Err(ApiError::config(format!(
            "Invalid API base URL '{base_url}': expected an http:// or https:// URL"
        )))
    }
}
