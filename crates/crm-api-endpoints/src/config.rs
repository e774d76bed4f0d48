use crate::catalog::Endpoint;
use crate::events::FallbackEvent;
use crm_api_core::events::{EventListeners, FnListener};
use crm_api_core::ErrorKind;

/// Configuration for [`FallbackCaller`](crate::FallbackCaller).
pub struct FallbackConfig {
    pub(crate) event_listeners: EventListeners<FallbackEvent>,
    pub(crate) name: String,
}

impl FallbackConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> FallbackConfigBuilder {
        FallbackConfigBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`FallbackConfig`].
pub struct FallbackConfigBuilder {
    event_listeners: EventListeners<FallbackEvent>,
    name: String,
}

impl FallbackConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the name used in events and log lines.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Called when the primary path failed and the fallback is about to run.
    pub fn on_fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(Endpoint, ErrorKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::FallbackTriggered {
                endpoint,
                primary_kind,
                ..
            } = event
            {
                f(*endpoint, *primary_kind);
            }
        }));
        self
    }

    /// Called on success with whether the fallback path produced the answer.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Endpoint, bool) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::Success {
                endpoint,
                via_fallback,
                ..
            } = event
            {
                f(*endpoint, *via_fallback);
            }
        }));
        self
    }

    /// Called with the surfaced error kind when a call fails for good.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(Endpoint, ErrorKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::Failed { endpoint, kind, .. } = event {
                f(*endpoint, *kind);
            }
        }));
        self
    }

    /// Called with the category and name of a lookup that is not in the catalog.
    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::Rejected { category, name, .. } = event {
                f(category.as_str(), name.as_str());
            }
        }));
        self
    }

    /// Builds the configuration without wrapping it in a layer.
    pub fn build_config(self) -> FallbackConfig {
        FallbackConfig {
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds the fallback layer.
    pub fn build(self) -> crate::FallbackLayer {
        crate::FallbackLayer::new(self.build_config())
    }
}

impl Default for FallbackConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
