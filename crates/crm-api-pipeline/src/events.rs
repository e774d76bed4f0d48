use crate::lead::LeadStatus;
use crm_api_core::events::ClientEvent;
use crm_api_core::ErrorKind;
use std::time::Instant;

/// Events emitted by the pipeline board.
#[derive(Debug, Clone)]
pub enum BoardEvent {
    /// A fresh lead list was published.
    Loaded {
        source_name: String,
        timestamp: Instant,
        count: usize,
    },
    /// A move was applied locally and its request dispatched.
    Applied {
        source_name: String,
        timestamp: Instant,
        lead_id: u64,
        from: LeadStatus,
        to: LeadStatus,
    },
    /// The backend accepted a move.
    Confirmed {
        source_name: String,
        timestamp: Instant,
        lead_id: u64,
        from: LeadStatus,
        to: LeadStatus,
    },
    /// The backend refused a move and the pre-move snapshot was restored.
    RolledBack {
        source_name: String,
        timestamp: Instant,
        lead_id: u64,
        from: LeadStatus,
        to: LeadStatus,
        kind: ErrorKind,
    },
    /// A move broke the terminal-state rule and was never applied.
    Rejected {
        source_name: String,
        timestamp: Instant,
        lead_id: u64,
        from: LeadStatus,
        to: LeadStatus,
    },
}

impl ClientEvent for BoardEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BoardEvent::Loaded { .. } => "loaded",
            BoardEvent::Applied { .. } => "applied",
            BoardEvent::Confirmed { .. } => "confirmed",
            BoardEvent::RolledBack { .. } => "rolled_back",
            BoardEvent::Rejected { .. } => "rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BoardEvent::Loaded { timestamp, .. }
            | BoardEvent::Applied { timestamp, .. }
            | BoardEvent::Confirmed { timestamp, .. }
            | BoardEvent::RolledBack { timestamp, .. }
            | BoardEvent::Rejected { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            BoardEvent::Loaded { source_name, .. }
            | BoardEvent::Applied { source_name, .. }
            | BoardEvent::Confirmed { source_name, .. }
            | BoardEvent::RolledBack { source_name, .. }
            | BoardEvent::Rejected { source_name, .. } => source_name,
        }
    }
}
