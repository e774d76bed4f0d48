use crm_api_core::events::ClientEvent;
use crm_api_core::ErrorKind;
use std::time::{Duration, Instant};

/// Events emitted by the retry coordinator.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// Attempt `attempt` failed with a retryable error; the next one starts
    /// after `delay`.
    Retry {
        source_name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// The call succeeded, on the first attempt or after retries.
    Success {
        source_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// Every attempt failed with a retryable error.
    Exhausted {
        source_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// A non-retryable error was returned as-is.
    IgnoredError {
        source_name: String,
        timestamp: Instant,
        kind: ErrorKind,
        attempts: usize,
    },
}

impl ClientEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::IgnoredError { .. } => "ignored_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RetryEvent::Retry { source_name, .. }
            | RetryEvent::Success { source_name, .. }
            | RetryEvent::Exhausted { source_name, .. }
            | RetryEvent::IgnoredError { source_name, .. } => source_name,
        }
    }
}
