//! Endpoint catalog and dual-endpoint calls for the CRM API.
//!
//! Several backend resources are reachable under two paths, a primary and a
//! fallback. [`FallbackCaller`] tries the primary path through the wrapped
//! request service and, if that fails with anything but a CONFIG error and a
//! fallback path exists, tries the fallback path exactly once more.
//!
//! The wrapped service is expected to be a retry-wrapped executor, so each of
//! the two paths gets the full retry policy.
//!
//! When both paths fail the fallback's error is returned, carrying the
//! primary's error in [`ApiError::primary_error`].
//!
//! ## Example
//!
//! ```rust
//! use crm_api_core::ApiError;
//! use crm_api_endpoints::FallbackLayer;
//! use crm_api_executor::{Method, RequestDescriptor};
//! use serde_json::{json, Value};
//! use tower::{service_fn, Layer};
//!
//! # async fn example() {
//! let requests = service_fn(|req: RequestDescriptor| async move {
//!     if req.path.starts_with("/api/") {
//!         Err(ApiError::http(500, "Internal Server Error", req.path.clone(), req.path.clone()))
//!     } else {
//!         Ok::<Value, ApiError>(json!([]))
//!     }
//! });
//!
//! let caller = FallbackLayer::builder().build().layer(requests);
//! let leads = caller.call_with_fallback("crm", "leads", Method::Get, None).await.unwrap();
//! assert_eq!(leads, json!([]));
//! # }
//! ```

use crm_api_core::ApiError;
use crm_api_executor::{Method, RequestDescriptor};
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::counter;

pub use catalog::{resolve, Category, Endpoint, EndpointDescriptor};
pub use config::{FallbackConfig, FallbackConfigBuilder};
pub use events::FallbackEvent;
pub use layer::FallbackLayer;

mod catalog;
mod config;
mod events;
mod layer;

/// One call against a catalog endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointCall {
    pub endpoint: Endpoint,
    pub method: Method,
    pub body: Option<Value>,
}

impl EndpointCall {
    pub fn new(endpoint: Endpoint, method: Method) -> Self {
        Self {
            endpoint,
            method,
            body: None,
        }
    }

    pub fn get(endpoint: Endpoint) -> Self {
        Self::new(endpoint, Method::Get)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn request(&self, path: &str) -> RequestDescriptor {
        RequestDescriptor::new(self.method, path).with_optional_body(self.body.clone())
    }
}

/// A Tower service that calls a catalog endpoint, falling back to its
/// secondary path when the primary fails.
pub struct FallbackCaller<S> {
    inner: S,
    config: Arc<FallbackConfig>,
}

impl<S> FallbackCaller<S> {
    pub(crate) fn new(inner: S, config: Arc<FallbackConfig>) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }
}

impl<S: Clone> Clone for FallbackCaller<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> FallbackCaller<S>
where
    S: Service<RequestDescriptor, Response = Value, Error = ApiError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    /// Resolves `category`/`name` and calls it.
    ///
    /// A lookup failure is returned as a CONFIG error without any request
    /// being made.
    pub fn call_with_fallback(
        &self,
        category: &str,
        name: &str,
        method: Method,
        body: Option<Value>,
    ) -> BoxFuture<'static, Result<Value, ApiError>> {
        match Endpoint::lookup(category, name) {
            Ok(endpoint) => self.call_endpoint(endpoint, method, body),
            Err(err) => {
                tracing::error!(caller = %self.config.name, category, name, error = %err, "[API] Endpoint lookup failed");
                self.config.event_listeners.emit(&FallbackEvent::Rejected {
                    source_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    category: category.to_string(),
                    name: name.to_string(),
                });

                #[cfg(feature = "metrics")]
                counter!("crm_api_fallback_calls_total", "caller" => self.config.name.clone(), "result" => "rejected").increment(1);

                Box::pin(futures::future::ready(Err(err)))
            }
        }
    }

    /// Calls a known endpoint.
    pub fn call_endpoint(
        &self,
        endpoint: Endpoint,
        method: Method,
        body: Option<Value>,
    ) -> BoxFuture<'static, Result<Value, ApiError>> {
        let call = EndpointCall {
            endpoint,
            method,
            body,
        };
        Box::pin(run(self.inner.clone(), Arc::clone(&self.config), call))
    }
}

impl<S> Service<EndpointCall> for FallbackCaller<S>
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

    fn call(&mut self, call: EndpointCall) -> Self::Future {
        Box::pin(run(self.inner.clone(), Arc::clone(&self.config), call))
    }
}

async fn run<S>(
    mut service: S,
    config: Arc<FallbackConfig>,
    call: EndpointCall,
) -> Result<Value, ApiError>
where
    S: Service<RequestDescriptor, Response = Value, Error = ApiError> + Send,
    S::Future: Send,
{
    let EndpointDescriptor { primary, fallback } = call.endpoint.descriptor();

    let primary_error = match service.ready().await?.call(call.request(primary)).await {
        Ok(value) => {
            config.event_listeners.emit(&FallbackEvent::Success {
                source_name: config.name.clone(),
                timestamp: Instant::now(),
                endpoint: call.endpoint,
                via_fallback: false,
            });

            #[cfg(feature = "metrics")]
            counter!("crm_api_fallback_calls_total", "caller" => config.name.clone(), "result" => "primary").increment(1);

            return Ok(value);
        }
        Err(err) => err,
    };

    let fallback_path = match fallback {
        Some(path) if primary_error.allows_fallback() => path,
        _ => {
            config.event_listeners.emit(&FallbackEvent::Failed {
                source_name: config.name.clone(),
                timestamp: Instant::now(),
                endpoint: call.endpoint,
                kind: primary_error.kind(),
                fallback_attempted: false,
            });

            #[cfg(feature = "metrics")]
            counter!("crm_api_fallback_calls_total", "caller" => config.name.clone(), "result" => "failed").increment(1);

            return Err(primary_error);
        }
    };

    tracing::warn!(
        caller = %config.name,
        endpoint = %call.endpoint,
        primary,
        fallback = fallback_path,
        error = %primary_error,
        "[API] Primary endpoint failed, trying fallback"
    );
    config.event_listeners.emit(&FallbackEvent::FallbackTriggered {
        source_name: config.name.clone(),
        timestamp: Instant::now(),
        endpoint: call.endpoint,
        primary_kind: primary_error.kind(),
    });

    match service.ready().await?.call(call.request(fallback_path)).await {
        Ok(value) => {
            config.event_listeners.emit(&FallbackEvent::Success {
                source_name: config.name.clone(),
                timestamp: Instant::now(),
                endpoint: call.endpoint,
                via_fallback: true,
            });

            #[cfg(feature = "metrics")]
            counter!("crm_api_fallback_calls_total", "caller" => config.name.clone(), "result" => "fallback").increment(1);

            Ok(value)
        }
        Err(err) => {
            tracing::error!(
                caller = %config.name,
                endpoint = %call.endpoint,
                primary_error = %primary_error,
                error = %err,
                "[API] Fallback endpoint failed too"
            );
            config.event_listeners.emit(&FallbackEvent::Failed {
                source_name: config.name.clone(),
                timestamp: Instant::now(),
                endpoint: call.endpoint,
                kind: err.kind(),
                fallback_attempted: true,
            });

            #[cfg(feature = "metrics")]
            counter!("crm_api_fallback_calls_total", "caller" => config.name.clone(), "result" => "failed").increment(1);

            Err(err.with_primary(primary_error))
        }
    }
}
