use crate::config::RetryConfig;
use crate::Retry;
use std::sync::Arc;
use tower::layer::Layer;

/// Applies the retry coordinator to a request service, usually a
/// `RequestExecutor`.
///
/// ```
/// use crm_api_retry::RetryLayer;
/// use std::time::Duration;
///
/// let layer = RetryLayer::builder()
///     .max_attempts(3)
///     .delay(Duration::from_millis(1000))
///     .name("crm-api")
///     .build();
/// ```
#[derive(Clone)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
}

impl RetryLayer {
    pub(crate) fn new(config: impl Into<Arc<RetryConfig>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Convenience for [`RetryConfig::builder`].
    pub fn builder() -> crate::RetryConfigBuilder {
        RetryConfig::builder()
    }
}

impl From<RetryConfig> for RetryLayer {
    fn from(config: RetryConfig) -> Self {
        Self::new(config)
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = Retry<S>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.config))
    }
}
