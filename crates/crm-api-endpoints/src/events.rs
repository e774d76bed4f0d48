use crate::catalog::Endpoint;
use crm_api_core::events::ClientEvent;
use crm_api_core::ErrorKind;
use std::time::Instant;

/// Events emitted by the dual-endpoint caller.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// The endpoint answered; `via_fallback` tells which path did.
    Success {
        source_name: String,
        timestamp: Instant,
        endpoint: Endpoint,
        via_fallback: bool,
    },
    /// The primary path failed and the fallback path is about to be tried.
    FallbackTriggered {
        source_name: String,
        timestamp: Instant,
        endpoint: Endpoint,
        primary_kind: ErrorKind,
    },
    /// The call failed for good.
    Failed {
        source_name: String,
        timestamp: Instant,
        endpoint: Endpoint,
        kind: ErrorKind,
        fallback_attempted: bool,
    },
    /// The category/name pair is not in the catalog; nothing was sent.
    Rejected {
        source_name: String,
        timestamp: Instant,
        category: String,
        name: String,
    },
}

impl ClientEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FallbackEvent::Success { .. } => "success",
            FallbackEvent::FallbackTriggered { .. } => "fallback_triggered",
            FallbackEvent::Failed { .. } => "failed",
            FallbackEvent::Rejected { .. } => "rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            FallbackEvent::Success { timestamp, .. }
            | FallbackEvent::FallbackTriggered { timestamp, .. }
            | FallbackEvent::Failed { timestamp, .. }
            | FallbackEvent::Rejected { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            FallbackEvent::Success { source_name, .. }
            | FallbackEvent::FallbackTriggered { source_name, .. }
            | FallbackEvent::Failed { source_name, .. }
            | FallbackEvent::Rejected { source_name, .. } => source_name,
        }
    }
}
