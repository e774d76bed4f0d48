//! Tower layer that turns a transport into a request executor.

use crate::config::ExecutorConfig;
use crate::RequestExecutor;
use std::sync::Arc;
use tower::layer::Layer;

/// Wraps a transport service into a [`RequestExecutor`].
#[derive(Clone)]
pub struct ExecutorLayer {
    config: Arc<ExecutorConfig>,
}

impl ExecutorLayer {
    pub(crate) fn new(config: impl Into<Arc<ExecutorConfig>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Convenience for [`ExecutorConfig::builder`].
    ///
    /// ```
    /// use crm_api_executor::{ExecutorLayer, ReqwestTransport};
    /// use tower::Layer;
    /// use std::time::Duration;
    ///
    /// let executor = ExecutorLayer::builder()
    ///     .base_url("http://localhost:8000")
    ///     .default_timeout(Duration::from_secs(10))
    ///     .bearer_token("token")
    ///     .build()
    ///     .layer(ReqwestTransport::new());
    /// ```
    pub fn builder() -> crate::ExecutorConfigBuilder {
        ExecutorConfig::builder()
    }
}

impl From<ExecutorConfig> for ExecutorLayer {
    fn from(config: ExecutorConfig) -> Self {
        Self::new(config)
    }
}

impl<T> Layer<T> for ExecutorLayer {
    type Service = RequestExecutor<T>;

    fn layer(&self, transport: T) -> Self::Service {
        RequestExecutor::new(transport, Arc::clone(&self.config))
    }
}
