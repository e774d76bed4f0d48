//! Fixed-delay retry coordination for CRM API requests.
//!
//! [`Retry`] wraps any request service (normally a `RequestExecutor`) and
//! re-issues a request only when it fails with an UNKNOWN error. TIMEOUT,
//! NETWORK, HTTP and CONFIG failures are returned immediately on the attempt
//! that produced them.
//!
//! Attempts are strictly sequential: attempt `n + 1` starts only after
//! attempt `n` has settled and the configured delay has elapsed. Each attempt
//! is stamped with its 1-based number so the executor can log it.
//!
//! When every attempt fails, the last error is re-wrapped as UNKNOWN with a
//! message noting the attempt count (see [`ApiError::exhausted`]).
//!
//! ## Example
//!
//! ```rust
//! use crm_api_core::ApiError;
//! use crm_api_executor::RequestDescriptor;
//! use crm_api_retry::RetryLayer;
//! use serde_json::{json, Value};
//! use std::time::Duration;
//! use tower::{service_fn, Layer, ServiceExt};
//!
//! # async fn example() {
//! let executor = service_fn(|_req: RequestDescriptor| async {
//!     Ok::<Value, ApiError>(json!({"ok": true}))
//! });
//!
//! let service = RetryLayer::builder()
//!     .max_attempts(3)
//!     .delay(Duration::from_millis(1000))
//!     .build()
//!     .layer(executor);
//!
//! let value = service.oneshot(RequestDescriptor::get("/api/crm/leads/")).await.unwrap();
//! assert_eq!(value, json!({"ok": true}));
//! # }
//! ```

use crm_api_core::ApiError;
use crm_api_executor::RequestDescriptor;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::counter;

pub use config::{RetryConfig, RetryConfigBuilder, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
pub use events::RetryEvent;
pub use layer::RetryLayer;

mod config;
mod events;
mod layer;

/// A Tower service that retries UNKNOWN failures with a fixed delay.
pub struct Retry<S> {
    inner: S,
    config: Arc<RetryConfig>,
}

impl<S> Retry<S> {
    pub(crate) fn new(inner: S, config: Arc<RetryConfig>) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// The wrapped service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S: Clone> Clone for Retry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> Retry<S>
where
    S: Service<RequestDescriptor, Response = Value, Error = ApiError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    /// Runs `descriptor` with the retry policy, giving every attempt `timeout`.
    pub fn execute(
        &self,
        descriptor: RequestDescriptor,
        timeout: Duration,
    ) -> BoxFuture<'static, Result<Value, ApiError>> {
        Box::pin(run(
            self.inner.clone(),
            Arc::clone(&self.config),
            descriptor.with_timeout(timeout),
        ))
    }
}

impl<S> Service<RequestDescriptor> for Retry<S>
where
    S: Service<RequestDescriptor, Response = Value, Error = ApiError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Value;
    type Error = ApiError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestDescriptor) -> Self::Future {
        Box::pin(run(self.inner.clone(), Arc::clone(&self.config), req))
    }
}

async fn run<S>(
    mut service: S,
    config: Arc<RetryConfig>,
    descriptor: RequestDescriptor,
) -> Result<Value, ApiError>
where
    S: Service<RequestDescriptor, Response = Value, Error = ApiError> + Send,
    S::Future: Send,
{
    let mut attempt = 1;

    loop {
        let request = descriptor.clone().with_attempt(attempt);
        let result = service.ready().await?.call(request).await;

        match result {
            Ok(value) => {
                config.event_listeners.emit(&RetryEvent::Success {
                    source_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                });
                return Ok(value);
            }
            Err(error) if !error.is_retryable() => {
                config.event_listeners.emit(&RetryEvent::IgnoredError {
                    source_name: config.name.clone(),
                    timestamp: Instant::now(),
                    kind: error.kind(),
                    attempts: attempt,
                });
                return Err(error);
            }
            Err(error) if attempt >= config.max_attempts => {
                tracing::error!(
                    retry = %config.name,
                    path = %descriptor.path,
                    attempts = attempt,
                    error = %error,
                    "[API] Giving up after {} attempts",
                    attempt
                );
                config.event_listeners.emit(&RetryEvent::Exhausted {
                    source_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                });
                return Err(error.exhausted(attempt));
            }
            Err(error) => {
                let delay = config.delay;
                tracing::warn!(
                    retry = %config.name,
                    path = %descriptor.path,
                    attempt,
                    error = %error,
                    "[API] Retrying in {}ms...",
                    delay.as_millis()
                );
                config.event_listeners.emit(&RetryEvent::Retry {
                    source_name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt,
                    delay,
                });

                #[cfg(feature = "metrics")]
                counter!("crm_api_retries_total", "retry" => config.name.clone()).increment(1);

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
