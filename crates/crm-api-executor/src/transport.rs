//! The HTTP transport boundary.
//!
//! Any `tower::Service<TransportRequest, Response = TransportResponse, Error = TransportError>`
//! can carry requests for the executor. [`ReqwestTransport`] is the production
//! implementation; tests usually plug in a `tower::service_fn`.

use crate::request::Method;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::task::{Context, Poll};
use thiserror::Error;
use tower::Service;

/// A fully-prepared request: absolute URL, final headers, serialized body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// What came back over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Reason phrase for `status`, e.g. `"Not Found"`.
    pub status_text: String,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// `200 OK` with `body`.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, "OK", body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The destination could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Anything else the transport reports.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// `reqwest`-backed transport.
///
/// No client-level timeout is configured; the executor owns timeout handling
/// and cancels the request by dropping its future.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an existing client, e.g. one with custom TLS or proxy settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Service<TransportRequest> for ReqwestTransport {
    type Response = TransportResponse;
    type Error = TransportError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: TransportRequest) -> Self::Future {
        let client = self.client.clone();

        Box::pin(async move {
            let mut builder = client.request(req.method.to_reqwest(), &req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status();
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            let body = response.text().await?;

            Ok(TransportResponse {
                status: status.as_u16(),
                status_text,
                body,
            })
        })
    }
}
