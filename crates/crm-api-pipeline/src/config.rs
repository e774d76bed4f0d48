use crate::events::BoardEvent;
use crate::lead::{Lead, LeadStatus};
use crate::PipelineBoard;
use crm_api_core::events::{EventListeners, FnListener};
use crm_api_core::ErrorKind;

/// Configuration for [`PipelineBoard`].
pub struct BoardConfig {
    pub(crate) event_listeners: EventListeners<BoardEvent>,
    pub(crate) name: String,
}

impl BoardConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BoardConfigBuilder {
        BoardConfigBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`PipelineBoard`].
pub struct BoardConfigBuilder {
    event_listeners: EventListeners<BoardEvent>,
    name: String,
    leads: Vec<Lead>,
}

impl BoardConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
            leads: Vec::new(),
        }
    }

    /// Sets the name used in events and log lines.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Seeds the board instead of starting empty.
    pub fn leads(mut self, leads: Vec<Lead>) -> Self {
        self.leads = leads;
        self
    }

    /// Called when a move has been applied locally.
    pub fn on_applied<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, LeadStatus, LeadStatus) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BoardEvent::Applied {
                lead_id, from, to, ..
            } = event
            {
                f(*lead_id, *from, *to);
            }
        }));
        self
    }

    /// Called when the backend accepts a move.
    pub fn on_confirmed<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, LeadStatus) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BoardEvent::Confirmed { lead_id, to, .. } = event {
                f(*lead_id, *to);
            }
        }));
        self
    }

    /// Called with the failure kind after a move was rolled back.
    pub fn on_rolled_back<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, ErrorKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BoardEvent::RolledBack { lead_id, kind, .. } = event {
                f(*lead_id, *kind);
            }
        }));
        self
    }

    /// Called when a move is refused by the terminal-state rule.
    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, LeadStatus, LeadStatus) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BoardEvent::Rejected {
                lead_id, from, to, ..
            } = event
            {
                f(*lead_id, *from, *to);
            }
        }));
        self
    }

    /// Builds the board around `service`, which carries the status updates.
    pub fn build<S>(self, service: S) -> PipelineBoard<S> {
        let config = BoardConfig {
            event_listeners: self.event_listeners,
            name: self.name,
        };
        PipelineBoard::new(service, config, self.leads)
    }
}

impl Default for BoardConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
