use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Pipeline stage of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
    Lost,
}

impl LeadStatus {
    /// Board column order.
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Converted,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "NEW",
            LeadStatus::Contacted => "CONTACTED",
            LeadStatus::Converted => "CONVERTED",
            LeadStatus::Lost => "LOST",
        }
    }

    /// Converted and lost leads never go back to NEW.
    pub fn can_move_to(self, to: LeadStatus) -> bool {
        !(matches!(self, LeadStatus::Converted | LeadStatus::Lost) && to == LeadStatus::New)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lead as shown on the board.
///
/// Only `id` and `status` matter to the board; every other field the backend
/// sends is kept in `fields` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: u64,
    pub status: LeadStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Lead {
    pub fn new(id: u64, status: LeadStatus) -> Self {
        Self {
            id,
            status,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub(crate) fn with_status(&self, status: LeadStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
