//! The whole client stack against a real HTTP server.

use crm_api::pipeline::{LeadStatus, MoveOutcome};
use crm_api::{ApiClient, ApiClientConfig, ErrorKind, Method};
use crm_api_tests::init_tracing;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::builder()
        .config(ApiClientConfig {
            base_url: server.uri(),
            retry_delay_ms: 10,
            ..ApiClientConfig::default()
        })
        .bearer_token("abc")
        .build()
        .unwrap()
}

#[tokio::test]
async fn list_falls_back_and_unwraps_pagination() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/invoices/"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "results": [{"id": 1}, {"id": 2}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items = client(&server).fetch_list("invoices", "list").await.unwrap();

    assert_eq!(items, vec![json!({"id": 1}), json!({"id": 2})]);
}

#[tokio::test]
async fn both_paths_failing_keeps_primary_error() {
    let server = MockServer::start().await;
    Mock::given(path("/api/crm/clients/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
        .mount(&server)
        .await;
    Mock::given(path("/crm/clients/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server)
        .call_with_fallback("crm", "clients", Method::Get, None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    let primary = err.primary_error().unwrap();
    assert_eq!(primary.message(), "API Error: 500 db down");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn missing_token_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(path("/api/accounts/profile/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.c"})))
        .mount(&server)
        .await;

    let client = ApiClient::builder()
        .base_url(server.uri())
        .token_provider(|| None::<String>)
        .build()
        .unwrap();
    let profile = client.get("/api/accounts/profile/").await.unwrap();

    assert_eq!(profile, json!({"email": "a@b.c"}));
    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn board_moves_patch_the_lead() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/crm/leads/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "status": "NEW", "email": "lead@example.com"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/crm/leads/5/"))
        .and(body_json(json!({"status": "CONTACTED"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "status": "CONTACTED"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/crm/leads/5/"))
        .and(body_json(json!({"status": "LOST"})))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not allowed"})))
        .mount(&server)
        .await;

    let board = client(&server).board();
    board.load().await.unwrap();

    let outcome = board.move_lead(5, LeadStatus::Contacted).await;
    assert!(outcome.is_applied());

    let outcome = board.move_lead(5, LeadStatus::Lost).await;
    match outcome {
        MoveOutcome::RolledBack { error, .. } => {
            assert_eq!(error.kind(), ErrorKind::Http);
            assert_eq!(error.message(), "API Error: 403 Not allowed");
        }
        other => panic!("expected rollback, got {other:?}"),
    }
    assert_eq!(board.snapshot()[0].status, LeadStatus::Contacted);
}
