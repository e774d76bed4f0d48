//! Single-attempt request execution for the CRM API.
//!
//! [`RequestExecutor`] issues exactly one transport attempt per call. It:
//! - attaches the bearer token and JSON body headers
//! - enforces a timeout, cancelling the transport future when it fires
//! - classifies every failure into an [`ApiError`]
//! - logs method, URL, attempt number, status and response body
//!
//! Retrying is not its job; wrap it in `crm-api-retry` for that.
//!
//! ## Example
//!
//! ```rust
//! use crm_api_executor::{ExecutorLayer, RequestDescriptor, TransportResponse, TransportRequest, TransportError};
//! use tower::{Layer, ServiceExt, service_fn};
//! use serde_json::json;
//!
//! # async fn example() {
//! let transport = service_fn(|_req: TransportRequest| async {
//!     Ok::<_, TransportError>(TransportResponse::ok(r#"{"ok":true}"#))
//! });
//!
//! let executor = ExecutorLayer::builder()
//!     .bearer_token("token")
//!     .build()
//!     .layer(transport);
//!
//! let value = executor.oneshot(RequestDescriptor::get("/api/x")).await.unwrap();
//! assert_eq!(value, json!({"ok": true}));
//! # }
//! ```

use crm_api_core::ApiError;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

pub use config::{
    validate_base_url, ExecutorConfig, ExecutorConfigBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
};
pub use events::ExecutorEvent;
pub use layer::ExecutorLayer;
pub use request::{Method, RequestDescriptor};
pub use response::list_items;
pub use token::{NoToken, StaticToken, TokenProvider};
pub use transport::{ReqwestTransport, TransportError, TransportRequest, TransportResponse};

mod config;
mod events;
mod layer;
mod request;
mod response;
mod token;
mod transport;

/// A Tower service that performs one classified HTTP attempt per request.
pub struct RequestExecutor<T> {
    transport: T,
    config: Arc<ExecutorConfig>,
}

impl<T> RequestExecutor<T> {
    pub(crate) fn new(transport: T, config: Arc<ExecutorConfig>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

impl<T: Clone> Clone for RequestExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T> RequestExecutor<T>
where
    T: Service<TransportRequest, Response = TransportResponse, Error = TransportError>
        + Clone
        + Send
        + 'static,
    T::Future: Send + 'static,
{
    /// Runs `descriptor` once with an explicit timeout.
    pub fn execute(
        &self,
        descriptor: RequestDescriptor,
        timeout: Duration,
    ) -> BoxFuture<'static, Result<Value, ApiError>> {
        let transport = self.transport.clone();
        let config = Arc::clone(&self.config);
        Box::pin(attempt(transport, config, descriptor.with_timeout(timeout)))
    }
}

impl<T> Service<RequestDescriptor> for RequestExecutor<T>
where
    T: Service<TransportRequest, Response = TransportResponse, Error = TransportError>
        + Clone
        + Send
        + 'static,
    T::Future: Send + 'static,
{
    type Response = Value;
    type Error = ApiError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RequestDescriptor) -> Self::Future {
        let transport = self.transport.clone();
        let config = Arc::clone(&self.config);
        Box::pin(attempt(transport, config, req))
    }
}

async fn attempt<T>(
    transport: T,
    config: Arc<ExecutorConfig>,
    descriptor: RequestDescriptor,
) -> Result<Value, ApiError>
where
    T: Service<TransportRequest, Response = TransportResponse, Error = TransportError> + Send,
    T::Future: Send,
{
    let url = descriptor.url(&config.base_url);
    let endpoint = descriptor.path.clone();
    let limit = descriptor.timeout.unwrap_or(config.default_timeout);

    let token = config.token_provider.token();
    if token.is_none() {
        tracing::debug!(executor = %config.name, %url, "No bearer token available");
    }
    let wire = descriptor.to_transport_request(&config.base_url, token.as_deref())?;

    tracing::debug!(
        executor = %config.name,
        method = %descriptor.method,
        %url,
        attempt = descriptor.attempt,
        "[API] {} {} (Attempt {})",
        descriptor.method,
        url,
        descriptor.attempt
    );
    config.event_listeners.emit(&ExecutorEvent::AttemptStarted {
        source_name: config.name.clone(),
        timestamp: Instant::now(),
        method: descriptor.method,
        url: url.clone(),
        attempt: descriptor.attempt,
    });

    let start = Instant::now();
    // Dropping the transport future on elapse is what cancels the attempt.
    let outcome = match timeout(limit, transport.oneshot(wire)).await {
        Err(_elapsed) => {
            tracing::error!(executor = %config.name, %url, timeout_ms = limit.as_millis() as u64, "[API] Request timeout");
            Err(ApiError::timeout(url.clone(), endpoint))
        }
        Ok(Err(TransportError::Connect(raw))) => {
            tracing::error!(executor = %config.name, %url, error = %raw, "[API] Network error");
            Err(ApiError::network(url.clone(), endpoint, raw))
        }
        Ok(Err(TransportError::Other(raw))) => {
            tracing::warn!(executor = %config.name, %url, error = %raw, "[API] Transport failure");
            Err(ApiError::unknown(raw, url.clone(), endpoint))
        }
        Ok(Ok(response)) => {
            let duration = start.elapsed();
            tracing::debug!(
                executor = %config.name,
                %url,
                status = response.status,
                body = %response.body,
                "[API] {} {}",
                response.status,
                response.status_text
            );
            config.event_listeners.emit(&ExecutorEvent::Response {
                source_name: config.name.clone(),
                timestamp: Instant::now(),
                url: url.clone(),
                status: response.status,
                duration,
            });
            classify_response(response, &url, &endpoint)
        }
    };

    #[cfg(feature = "metrics")]
    histogram!("crm_api_request_duration_seconds", "executor" => config.name.clone())
        .record(start.elapsed().as_secs_f64());

    match &outcome {
        Ok(_) => {
            #[cfg(feature = "metrics")]
            counter!("crm_api_requests_total", "executor" => config.name.clone(), "result" => "success").increment(1);
        }
        Err(err) => {
            config.event_listeners.emit(&ExecutorEvent::Failed {
                source_name: config.name.clone(),
                timestamp: Instant::now(),
                url,
                kind: err.kind(),
                duration: start.elapsed(),
            });

            #[cfg(feature = "metrics")]
            counter!("crm_api_requests_total", "executor" => config.name.clone(), "result" => err.kind().as_str()).increment(1);
        }
    }

    outcome
}

fn classify_response(
    response: TransportResponse,
    url: &str,
    endpoint: &str,
) -> Result<Value, ApiError> {
    if !response.is_success() {
        let reason = error_reason(&response.body).unwrap_or(response.status_text);
        return Err(ApiError::http(response.status, reason, url, endpoint));
    }

    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&response.body).map_err(|e| {
        ApiError::unknown(format!("Invalid JSON in response: {e}"), url, endpoint)
    })
}

/// Pulls a server-provided message out of an error body: `error` first,
/// then `detail`.
fn error_reason(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "detail"].iter().find_map(|key| {
        value
            .get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
