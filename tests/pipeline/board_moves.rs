//! Moves observed through a board subscription.

use crm_api::pipeline::{LeadStatus, MoveOutcome};
use crm_api::{ApiClient, ErrorKind, Method};
use crm_api_executor::{TransportError, TransportRequest, TransportResponse};
use crm_api_tests::init_tracing;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::Notify;
use tower::Service;

const LEADS: &str = r#"[
    {"id": 1, "status": "NEW", "name": "Ada"},
    {"id": 2, "status": "CONTACTED", "name": "Grace"},
    {"id": 3, "status": "LOST", "name": "Edsger"}
]"#;

type PatchAnswer = dyn Fn() -> Result<TransportResponse, TransportError> + Send + Sync;

/// Backend serving the lead list; PATCH answers wait for `release`.
#[derive(Clone)]
struct Backend {
    release: Arc<Notify>,
    patch: Arc<PatchAnswer>,
    patches: Arc<Mutex<Vec<TransportRequest>>>,
}

impl Backend {
    fn new<F>(patch: F) -> Self
    where
        F: Fn() -> Result<TransportResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            release: Arc::new(Notify::new()),
            patch: Arc::new(patch),
            patches: Arc::default(),
        }
    }

    fn client(&self) -> ApiClient<Backend> {
        ApiClient::builder()
            .bearer_token("abc")
            .build_with_transport(self.clone())
            .unwrap()
    }
}

impl Service<TransportRequest> for Backend {
    type Response = TransportResponse;
    type Error = TransportError;
    type Future = BoxFuture<'static, Result<TransportResponse, TransportError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: TransportRequest) -> Self::Future {
        let backend = self.clone();
        Box::pin(async move {
            if req.method != Method::Patch {
                return Ok(TransportResponse::ok(LEADS));
            }
            backend.patches.lock().unwrap().push(req);
            backend.release.notified().await;
            (backend.patch)()
        })
    }
}

fn status_of(leads: &[crm_api::pipeline::Lead], id: u64) -> LeadStatus {
    leads.iter().find(|l| l.id == id).map(|l| l.status).unwrap()
}

#[tokio::test]
async fn move_is_visible_before_the_backend_answers() {
    init_tracing();
    let backend = Backend::new(|| Ok(TransportResponse::ok(r#"{"id":1,"status":"CONTACTED"}"#)));
    let board = backend.client().board();
    board.load().await.unwrap();

    let mut rx = board.subscribe();
    rx.borrow_and_update();

    let mover = board.clone();
    let handle = tokio::spawn(async move { mover.move_lead(1, LeadStatus::Contacted).await });

    rx.changed().await.unwrap();
    assert_eq!(status_of(&rx.borrow_and_update(), 1), LeadStatus::Contacted);
    assert!(!handle.is_finished());

    let patches = backend.patches.lock().unwrap().clone();
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].url, "http://localhost:8000/api/crm/leads/1/");
    assert_eq!(patches[0].body.as_deref(), Some(r#"{"status":"CONTACTED"}"#));

    backend.release.notify_one();
    let outcome = handle.await.unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Confirmed {
            from: LeadStatus::New,
            to: LeadStatus::Contacted
        }
    );
    assert!(!rx.has_changed().unwrap());
    assert_eq!(status_of(&board.snapshot(), 1), LeadStatus::Contacted);
}

#[tokio::test]
async fn refused_move_restores_the_pre_move_list() {
    let backend = Backend::new(|| {
        Ok(TransportResponse::new(
            400,
            "Bad Request",
            r#"{"error":"Invalid status transition"}"#,
        ))
    });
    let board = backend.client().board();
    board.load().await.unwrap();
    let before = board.snapshot();

    let mut rx = board.subscribe();
    rx.borrow_and_update();

    let mover = board.clone();
    let handle = tokio::spawn(async move { mover.move_lead(2, LeadStatus::Converted).await });

    rx.changed().await.unwrap();
    assert_eq!(status_of(&rx.borrow_and_update(), 2), LeadStatus::Converted);

    backend.release.notify_one();
    let outcome = handle.await.unwrap();
    let MoveOutcome::RolledBack { from, to, error } = outcome else {
        panic!("expected a rollback, got {outcome:?}");
    };
    assert_eq!((from, to), (LeadStatus::Contacted, LeadStatus::Converted));
    assert_eq!(error.kind(), ErrorKind::Http);
    assert_eq!(error.message(), "API Error: 400 Invalid status transition");

    assert!(rx.has_changed().unwrap());
    assert!(Arc::ptr_eq(&rx.borrow_and_update(), &before));
    assert_eq!(*board.snapshot(), *before);
    assert_eq!(backend.patches.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_backend_rolls_back() {
    let backend = Backend::new(|| Err(TransportError::Connect("refused".to_string())));
    backend.release.notify_one();
    let board = backend.client().board();
    board.load().await.unwrap();
    let before = board.snapshot();

    let outcome = board.move_lead(3, LeadStatus::Contacted).await;

    assert!(matches!(
        outcome,
        MoveOutcome::RolledBack { ref error, .. } if error.is_network()
    ));
    assert!(!outcome.is_applied());
    assert_eq!(*board.snapshot(), *before);
}

#[tokio::test]
async fn other_fields_survive_a_move() {
    let backend = Backend::new(|| Ok(TransportResponse::ok("{}")));
    backend.release.notify_one();
    let board = backend.client().board();
    board.load().await.unwrap();

    board.move_lead(2, LeadStatus::Lost).await;

    let snapshot = board.snapshot();
    let lead = snapshot.iter().find(|l| l.id == 2).unwrap();
    assert_eq!(lead.status, LeadStatus::Lost);
    assert_eq!(lead.fields.get("name"), Some(&serde_json::json!("Grace")));
    assert_eq!(snapshot.len(), 3);
}
