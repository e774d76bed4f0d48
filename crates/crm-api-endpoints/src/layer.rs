use crate::config::FallbackConfig;
use crate::FallbackCaller;
use std::sync::Arc;
use tower::layer::Layer;

/// Turns a (retry-wrapped) request service into a [`FallbackCaller`].
///
/// ```
/// use crm_api_endpoints::FallbackLayer;
///
/// let layer = FallbackLayer::builder()
///     .name("crm-api")
///     .on_fallback(|endpoint, kind| println!("{endpoint} failed with {kind}"))
///     .build();
/// ```
#[derive(Clone)]
pub struct FallbackLayer {
    config: Arc<FallbackConfig>,
}

impl FallbackLayer {
    pub(crate) fn new(config: impl Into<Arc<FallbackConfig>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Convenience for [`FallbackConfig::builder`].
    pub fn builder() -> crate::FallbackConfigBuilder {
        FallbackConfig::builder()
    }
}

impl From<FallbackConfig> for FallbackLayer {
    fn from(config: FallbackConfig) -> Self {
        Self::new(config)
    }
}

impl<S> Layer<S> for FallbackLayer {
    type Service = FallbackCaller<S>;

    fn layer(&self, service: S) -> Self::Service {
        FallbackCaller::new(service, Arc::clone(&self.config))
    }
}
