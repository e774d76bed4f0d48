//! The reqwest transport against a live HTTP server.

use crm_api_core::error::{NETWORK_MESSAGE, TIMEOUT_MESSAGE};
use crm_api_core::ErrorKind;
use crm_api_executor::{ExecutorLayer, RequestDescriptor, ReqwestTransport};
use serde_json::json;
use std::time::Duration;
use tower::{Layer, ServiceExt};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor(
    base_url: &str,
    timeout: Duration,
) -> crm_api_executor::RequestExecutor<ReqwestTransport> {
    ExecutorLayer::builder()
        .base_url(base_url)
        .default_timeout(timeout)
        .bearer_token("abc")
        .build()
        .layer(ReqwestTransport::new())
}

#[tokio::test]
async fn sends_json_body_with_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customers/"))
        .and(header("Authorization", "Bearer abc"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"name": "Ada"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 12, "name": "Ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let value = executor(&server.uri(), Duration::from_secs(5))
        .oneshot(RequestDescriptor::post("/api/customers/", json!({"name": "Ada"})))
        .await
        .unwrap();

    assert_eq!(value, json!({"id": 12, "name": "Ada"}));
}

#[tokio::test]
async fn get_sends_no_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/crm/leads/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    executor(&server.uri(), Duration::from_secs(5))
        .oneshot(RequestDescriptor::get("/api/crm/leads/"))
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("content-type").is_none());
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn error_bodies_are_classified() {
    let server = MockServer::start().await;
    Mock::given(path("/limit/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"error": "Lead limit reached for plan"})),
        )
        .mount(&server)
        .await;
    Mock::given(path("/auth/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Authentication credentials were not provided."})),
        )
        .mount(&server)
        .await;
    Mock::given(path("/gone/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let executor = executor(&server.uri(), Duration::from_secs(5));
    let message = |path: &'static str| {
        let executor = executor.clone();
        async move {
            let err = executor
                .oneshot(RequestDescriptor::get(path))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Http);
            err.message().to_string()
        }
    };

    assert_eq!(message("/limit/").await, "API Error: 403 Lead limit reached for plan");
    assert_eq!(
        message("/auth/").await,
        "API Error: 401 Authentication credentials were not provided."
    );
    assert_eq!(message("/gone/").await, "API Error: 404 Not Found");
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/slow/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = executor(&server.uri(), Duration::from_millis(100))
        .oneshot(RequestDescriptor::get("/slow/"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.message(), TIMEOUT_MESSAGE);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let err = executor("http://127.0.0.1:1", Duration::from_secs(5))
        .oneshot(RequestDescriptor::get("/api/crm/leads/"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.message(), NETWORK_MESSAGE);
    assert!(err.context().raw_message.is_some());
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/invoices/9/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let value = executor(&server.uri(), Duration::from_secs(5))
        .oneshot(RequestDescriptor::delete("/api/invoices/9/"))
        .await
        .unwrap();
    assert!(value.is_null());
}
