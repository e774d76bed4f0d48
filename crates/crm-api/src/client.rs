//! The client facade.

use crate::config::{ApiClientConfig, ConfigError};
use crm_api_core::ApiError;
use crm_api_endpoints::{Endpoint, FallbackCaller, FallbackConfigBuilder, FallbackLayer};
use crm_api_executor::{
    list_items, ExecutorConfigBuilder, ExecutorLayer, Method, RequestDescriptor, RequestExecutor,
    ReqwestTransport, TokenProvider, TransportError, TransportRequest, TransportResponse,
};
use crm_api_pipeline::{BoardConfig, BoardConfigBuilder, PipelineBoard};
use crm_api_retry::{Retry, RetryConfigBuilder, RetryLayer};
use serde_json::Value;
use std::time::Duration;
use tower::{Layer, ServiceExt};

/// Executor wrapped in the retry coordinator: the service every request goes
/// through.
pub type RequestStack<T> = Retry<RequestExecutor<T>>;

/// CRM API client.
///
/// Plain requests go through the retry-wrapped executor; catalog calls add
/// the primary/fallback strategy on top.
pub struct ApiClient<T = ReqwestTransport> {
    requests: RequestStack<T>,
    endpoints: FallbackCaller<RequestStack<T>>,
}

impl<T: Clone> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            endpoints: self.endpoints.clone(),
        }
    }
}

impl ApiClient<ReqwestTransport> {
    /// Creates a builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Client configured from the environment, without a token.
    pub fn from_env() -> Result<Self, ConfigError> {
        ApiClientBuilder::new()
            .config(ApiClientConfig::from_env()?)
            .build()
    }
}

impl<T> ApiClient<T>
where
    T: tower::Service<TransportRequest, Response = TransportResponse, Error = TransportError>
        + Clone
        + Send
        + 'static,
    T::Future: Send + 'static,
{
    /// Sends `descriptor` with the retry policy.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Value, ApiError> {
        self.requests.clone().oneshot(descriptor).await
    }

    /// Like [`request`](Self::request) with an explicit per-attempt timeout.
    pub async fn request_with_timeout(
        &self,
        descriptor: RequestDescriptor,
        timeout: Duration,
    ) -> Result<Value, ApiError> {
        self.requests.execute(descriptor, timeout).await
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::post(path, body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::put(path, body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::patch(path, body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(RequestDescriptor::delete(path)).await
    }

    /// Calls catalog entry `category`/`name`, falling back to its secondary
    /// path when the primary fails.
    pub async fn call_with_fallback(
        &self,
        category: &str,
        name: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.endpoints
            .call_with_fallback(category, name, method, body)
            .await
    }

    pub async fn call_endpoint(
        &self,
        endpoint: Endpoint,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.endpoints.call_endpoint(endpoint, method, body).await
    }

    /// GETs a list endpoint with fallback and returns its items, whether the
    /// backend answered with a bare array or a paginated `results` object.
    pub async fn fetch_list(&self, category: &str, name: &str) -> Result<Vec<Value>, ApiError> {
        let value = self
            .call_with_fallback(category, name, Method::Get, None)
            .await?;
        Ok(list_items(value))
    }

    /// A pipeline board sending its updates through this client.
    pub fn board(&self) -> PipelineBoard<RequestStack<T>> {
        self.board_with(BoardConfig::builder())
    }

    /// Like [`board`](Self::board) with a customized board builder.
    pub fn board_with(&self, builder: BoardConfigBuilder) -> PipelineBoard<RequestStack<T>> {
        builder.build(self.requests.clone())
    }

    /// The retry-wrapped executor, for composing further layers.
    pub fn request_service(&self) -> RequestStack<T> {
        self.requests.clone()
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ApiClientConfig,
    name: String,
    executor: ExecutorConfigBuilder,
    retry: RetryConfigBuilder,
    fallback: FallbackConfigBuilder,
}

impl ApiClientBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: ApiClientConfig::default(),
            name: String::from("crm-api"),
            executor: ExecutorLayer::builder(),
            retry: RetryLayer::builder(),
            fallback: FallbackLayer::builder(),
        }
    }

    /// Sets base URL, timeout and retry policy.
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the name shared by every layer in events and log lines.
    ///
    /// Default: `"crm-api"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets where bearer tokens come from.
    pub fn token_provider<P>(mut self, provider: P) -> Self
    where
        P: TokenProvider + 'static,
    {
        self.executor = self.executor.token_provider(provider);
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.executor = self.executor.bearer_token(token);
        self
    }

    /// Called before each transport attempt with method, URL and attempt number.
    pub fn on_attempt<F>(mut self, f: F) -> Self
    where
        F: Fn(Method, &str, usize) + Send + Sync + 'static,
    {
        self.executor = self.executor.on_attempt(f);
        self
    }

    /// Called with the HTTP status whenever the backend answers.
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(u16) + Send + Sync + 'static,
    {
        self.executor = self.executor.on_response(f);
        self
    }

    /// Called after each retryable failure with the failed attempt number and
    /// the delay before the next one.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.retry = self.retry.on_retry(f);
        self
    }

    /// Called when a primary endpoint fails and its fallback is tried.
    pub fn on_fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(Endpoint, crm_api_core::ErrorKind) + Send + Sync + 'static,
    {
        self.fallback = self.fallback.on_fallback(f);
        self
    }

    /// Builds a client over `reqwest`.
    pub fn build(self) -> Result<ApiClient<ReqwestTransport>, ConfigError> {
        self.build_with_transport(ReqwestTransport::new())
    }

    /// Builds a client over a custom transport.
    pub fn build_with_transport<T: Clone>(self, transport: T) -> Result<ApiClient<T>, ConfigError> {
        self.config.validate()?;
        tracing::debug!(
            client = %self.name,
            base_url = %self.config.base_url,
            timeout_ms = self.config.timeout_ms,
            retry_attempts = self.config.retry_attempts,
            retry_delay_ms = self.config.retry_delay_ms,
            "[API] Client configured"
        );

        let executor = self
            .executor
            .base_url(self.config.base_url.clone())
            .default_timeout(self.config.timeout())
            .name(self.name.clone())
            .build()
            .layer(transport);
        let requests = self
            .retry
            .max_attempts(self.config.retry_attempts)
            .delay(self.config.retry_delay())
            .name(self.name.clone())
            .build()
            .layer(executor);
        let endpoints = self
            .fallback
            .name(self.name)
            .build()
            .layer(requests.clone());

        Ok(ApiClient {
            requests,
            endpoints,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
