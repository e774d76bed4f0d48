//! Optimistic lead pipeline board.
//!
//! [`PipelineBoard`] holds the visible lead list and moves leads between
//! stages optimistically: a move is published to subscribers first, the
//! status update is sent second, and if the backend refuses it the whole
//! pre-move list is published again.
//!
//! Each move runs through `IDLE -> APPLIED_LOCALLY -> {CONFIRMED | ROLLED_BACK}`:
//!
//! - moving a CONVERTED or LOST lead to NEW is refused before anything changes
//! - moving a lead to the stage it is already in does nothing
//! - otherwise the updated list is published and `PATCH /api/crm/leads/<id>/`
//!   with `{"status": <stage>}` is dispatched with no suspension in between
//!
//! The list is replaced as a whole on every change, so a subscriber only ever
//! observes the list before or after a transition.
//!
//! ## Example
//!
//! ```rust
//! use crm_api_core::ApiError;
//! use crm_api_executor::RequestDescriptor;
//! use crm_api_pipeline::{BoardConfig, Lead, LeadStatus, MoveOutcome};
//! use serde_json::Value;
//! use tower::service_fn;
//!
//! # async fn example() {
//! let service = service_fn(|_req: RequestDescriptor| async { Ok::<_, ApiError>(Value::Null) });
//! let board = BoardConfig::builder()
//!     .leads(vec![Lead::new(1, LeadStatus::New)])
//!     .build(service);
//!
//! let outcome = board.move_lead(1, LeadStatus::Contacted).await;
//! assert!(matches!(outcome, MoveOutcome::Confirmed { .. }));
//! assert_eq!(board.snapshot()[0].status, LeadStatus::Contacted);
//! # }
//! ```

use crm_api_core::ApiError;
use crm_api_executor::{list_items, RequestDescriptor};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::counter;

pub use config::{BoardConfig, BoardConfigBuilder};
pub use events::BoardEvent;
pub use lead::{Lead, LeadStatus};

mod config;
mod events;
mod lead;

/// Path the board loads leads from.
pub const LEADS_PATH: &str = "/api/crm/leads/";

/// Published board state.
pub type Leads = Arc<Vec<Lead>>;

/// How a move ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The lead already had the requested status.
    Unchanged,
    /// No lead with that id is on the board.
    NotFound,
    /// The move broke the terminal-state rule; nothing was changed or sent.
    Rejected { from: LeadStatus, to: LeadStatus },
    /// The backend accepted the move.
    Confirmed { from: LeadStatus, to: LeadStatus },
    /// The backend refused the move and the pre-move list was restored.
    RolledBack {
        from: LeadStatus,
        to: LeadStatus,
        error: ApiError,
    },
    /// The request service could not accept a request; nothing was changed.
    Unavailable(ApiError),
}

impl MoveOutcome {
    /// True when the board now shows the requested status.
    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Unchanged | MoveOutcome::Confirmed { .. })
    }
}

/// Why a move leaves the board as it is.
enum Refusal {
    NotFound,
    Unchanged,
    Rejected(LeadStatus),
}

enum Transition {
    Refused(Refusal),
    Applied { from: LeadStatus, previous: Leads },
}

/// Returns the lead's current status when moving it to `to` is allowed.
fn check_move(leads: &[Lead], lead_id: u64, to: LeadStatus) -> Result<LeadStatus, Refusal> {
    let lead = leads
        .iter()
        .find(|l| l.id == lead_id)
        .ok_or(Refusal::NotFound)?;
    if lead.status == to {
        return Err(Refusal::Unchanged);
    }
    if !lead.status.can_move_to(to) {
        return Err(Refusal::Rejected(lead.status));
    }
    Ok(lead.status)
}

/// The lead board of the CRM pipeline page.
pub struct PipelineBoard<S> {
    service: S,
    config: Arc<BoardConfig>,
    state: Arc<watch::Sender<Leads>>,
}

impl<S: Clone> Clone for PipelineBoard<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> PipelineBoard<S> {
    pub(crate) fn new(service: S, config: BoardConfig, leads: Vec<Lead>) -> Self {
        let (state, _) = watch::channel(Arc::new(leads));
        Self {
            service,
            config: Arc::new(config),
            state: Arc::new(state),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Receives every published list.
    pub fn subscribe(&self) -> watch::Receiver<Leads> {
        self.state.subscribe()
    }

    /// The list as currently published.
    pub fn snapshot(&self) -> Leads {
        Arc::clone(&self.state.borrow())
    }

    /// Leads grouped by status in board order: NEW, CONTACTED, CONVERTED, LOST.
    pub fn columns(&self) -> Vec<(LeadStatus, Vec<Lead>)> {
        let leads = self.snapshot();
        LeadStatus::ALL
            .into_iter()
            .map(|status| {
                let column = leads.iter().filter(|l| l.status == status).cloned().collect();
                (status, column)
            })
            .collect()
    }

    /// Publishes `leads` as the new board state.
    pub fn replace(&self, leads: Vec<Lead>) {
        let count = leads.len();
        self.state.send_replace(Arc::new(leads));
        self.config.event_listeners.emit(&BoardEvent::Loaded {
            source_name: self.config.name.clone(),
            timestamp: Instant::now(),
            count,
        });
    }

    fn transition(&self, lead_id: u64, to: LeadStatus) -> Transition {
        let mut transition = Transition::Refused(Refusal::NotFound);

        self.state.send_if_modified(|leads| {
            let from = match check_move(leads, lead_id, to) {
                Ok(from) => from,
                Err(refusal) => {
                    transition = Transition::Refused(refusal);
                    return false;
                }
            };

            let next = leads
                .iter()
                .map(|l| if l.id == lead_id { l.with_status(to) } else { l.clone() })
                .collect();
            let previous = std::mem::replace(leads, Arc::new(next));
            transition = Transition::Applied { from, previous };
            true
        });

        transition
    }

    fn refuse(&self, lead_id: u64, to: LeadStatus, refusal: Refusal) -> MoveOutcome {
        match refusal {
            Refusal::NotFound => {
                tracing::debug!(board = %self.config.name, lead_id, "[Pipeline] Lead not on board");
                MoveOutcome::NotFound
            }
            Refusal::Rejected(from) => {
                tracing::warn!(board = %self.config.name, lead_id, %from, %to, "[Pipeline] Cannot move from LOST/CONVERTED to NEW");
                self.config.event_listeners.emit(&BoardEvent::Rejected {
                    source_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    lead_id,
                    from,
                    to,
                });

                #[cfg(feature = "metrics")]
                counter!("crm_api_board_moves_total", "board" => self.config.name.clone(), "result" => "rejected").increment(1);

                MoveOutcome::Rejected { from, to }
            }
            Refusal::Unchanged => MoveOutcome::Unchanged,
        }
    }
}

impl<S> PipelineBoard<S>
where
    S: Service<RequestDescriptor, Response = Value, Error = ApiError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    /// Fetches the lead list and publishes it. Returns the number of leads.
    ///
    /// The board is left untouched when the request or the decoding fails.
    pub async fn load(&self) -> Result<usize, ApiError> {
        let mut service = self.service.clone();
        let value = service
            .ready()
            .await?
            .call(RequestDescriptor::get(LEADS_PATH))
            .await?;

        let leads = list_items(value)
            .into_iter()
            .map(serde_json::from_value::<Lead>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                ApiError::unknown(format!("Invalid lead in response: {e}"), LEADS_PATH, LEADS_PATH)
            })?;

        let count = leads.len();
        tracing::debug!(board = %self.config.name, count, "[Pipeline] Loaded leads");
        self.replace(leads);
        Ok(count)
    }

    /// Moves lead `lead_id` to `to`.
    ///
    /// A failed update restores the board exactly as it was before the move,
    /// dropping anything published meanwhile, including a `load` or `replace`.
    pub async fn move_lead(&self, lead_id: u64, to: LeadStatus) -> MoveOutcome {
        // Move rules depend on board state only, never on the service.
        if let Err(refusal) = check_move(&self.snapshot(), lead_id, to) {
            return self.refuse(lead_id, to, refusal);
        }

        let mut service = self.service.clone();
        // Readiness is awaited before the local apply so nothing suspends
        // between the apply and the dispatch.
        if let Err(err) = service.ready().await {
            tracing::error!(board = %self.config.name, lead_id, error = %err, "[Pipeline] Request service unavailable");
            return MoveOutcome::Unavailable(err);
        }

        // Checked again; the board may have changed while waiting.
        let (from, previous) = match self.transition(lead_id, to) {
            Transition::Applied { from, previous } => (from, previous),
            Transition::Refused(refusal) => return self.refuse(lead_id, to, refusal),
        };

        let request =
            RequestDescriptor::patch(format!("{LEADS_PATH}{lead_id}/"), json!({ "status": to }));
        let response = service.call(request);

        self.config.event_listeners.emit(&BoardEvent::Applied {
            source_name: self.config.name.clone(),
            timestamp: Instant::now(),
            lead_id,
            from,
            to,
        });

        match response.await {
            Ok(_) => {
                tracing::debug!(board = %self.config.name, lead_id, %from, %to, "[Pipeline] Move confirmed");
                self.config.event_listeners.emit(&BoardEvent::Confirmed {
                    source_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    lead_id,
                    from,
                    to,
                });

                #[cfg(feature = "metrics")]
                counter!("crm_api_board_moves_total", "board" => self.config.name.clone(), "result" => "confirmed").increment(1);

                MoveOutcome::Confirmed { from, to }
            }
            Err(error) => {
                tracing::error!(board = %self.config.name, lead_id, %from, %to, error = %error, "[Pipeline] Update failed, rolling back");
                self.state.send_replace(previous);
                self.config.event_listeners.emit(&BoardEvent::RolledBack {
                    source_name: self.config.name.clone(),
                    timestamp: Instant::now(),
                    lead_id,
                    from,
                    to,
                    kind: error.kind(),
                });

                #[cfg(feature = "metrics")]
                counter!("crm_api_board_moves_total", "board" => self.config.name.clone(), "result" => "rolled_back").increment(1);

                MoveOutcome::RolledBack { from, to, error }
            }
        }
    }
}
