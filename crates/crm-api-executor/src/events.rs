use crate::request::Method;
use crm_api_core::events::ClientEvent;
use crm_api_core::ErrorKind;
use std::time::{Duration, Instant};

/// Events emitted by the request executor.
#[derive(Debug, Clone)]
pub enum ExecutorEvent {
    /// A transport attempt is about to be sent.
    AttemptStarted {
        source_name: String,
        timestamp: Instant,
        method: Method,
        url: String,
        attempt: usize,
    },
    /// The backend answered, successfully or not.
    Response {
        source_name: String,
        timestamp: Instant,
        url: String,
        status: u16,
        duration: Duration,
    },
    /// The attempt failed and was classified.
    Failed {
        source_name: String,
        timestamp: Instant,
        url: String,
        kind: ErrorKind,
        duration: Duration,
    },
}

impl ClientEvent for ExecutorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExecutorEvent::AttemptStarted { .. } => "attempt_started",
            ExecutorEvent::Response { .. } => "response",
            ExecutorEvent::Failed { .. } => "failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ExecutorEvent::AttemptStarted { timestamp, .. }
            | ExecutorEvent::Response { timestamp, .. }
            | ExecutorEvent::Failed { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            ExecutorEvent::AttemptStarted { source_name, .. }
            | ExecutorEvent::Response { source_name, .. }
            | ExecutorEvent::Failed { source_name, .. } => source_name,
        }
    }
}
