//! Shared helpers for the workspace integration tests.
//!
//! Run with: cargo test

use crm_api_executor::{TransportError, TransportRequest, TransportResponse};
use std::sync::{Arc, Mutex, Once};
use std::task::{Context, Poll};
use tower::Service;

static TRACING: Once = Once::new();

/// Routes `tracing` output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

type Respond =
    dyn Fn(&TransportRequest, usize) -> Result<TransportResponse, TransportError> + Send + Sync;

/// In-memory transport answering with a closure of `(request, call_index)`.
///
/// Every request is recorded so tests can assert on URLs, headers and bodies.
#[derive(Clone)]
pub struct ScriptedTransport {
    seen: Arc<Mutex<Vec<TransportRequest>>>,
    respond: Arc<Respond>,
}

impl ScriptedTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&TransportRequest, usize) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            seen: Arc::default(),
            respond: Arc::new(respond),
        }
    }

    /// Answers every request with `200 OK` and `body`.
    pub fn ok(body: &'static str) -> Self {
        Self::new(move |_, _| Ok(TransportResponse::ok(body)))
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Service<TransportRequest> for ScriptedTransport {
    type Response = TransportResponse;
    type Error = TransportError;
    type Future = std::future::Ready<Result<TransportResponse, TransportError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: TransportRequest) -> Self::Future {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        let result = (self.respond)(&req, seen.len());
        seen.push(req);
        std::future::ready(result)
    }
}
