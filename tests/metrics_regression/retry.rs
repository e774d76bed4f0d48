//! Retry metrics regression tests

use super::helpers::*;
use crm_api_executor::{ExecutorLayer, RequestDescriptor, TransportError, TransportResponse};
use crm_api_retry::RetryLayer;
use crm_api_tests::ScriptedTransport;
use serial_test::serial;
use std::time::Duration;
use tower::{Layer, ServiceExt};

#[tokio::test]
#[serial]
async fn retry_metrics_exist() {
    init_recorder();

    let transport = ScriptedTransport::new(|_, call| {
        if call < 2 {
            Err(TransportError::Other("reset".to_string()))
        } else {
            Ok(TransportResponse::ok("{}"))
        }
    });
    let executor = ExecutorLayer::builder().build().layer(transport);
    let retry = RetryLayer::builder()
        .name("metrics_retry")
        .delay(Duration::from_millis(1))
        .build()
        .layer(executor);

    retry.oneshot(RequestDescriptor::get("/x/")).await.unwrap();

    assert_counter_exists("crm_api_retries_total");
    assert_metric_has_label("crm_api_retries_total", "retry", "metrics_retry");
    assert_metric_has_label("crm_api_requests_total", "result", "UNKNOWN");
}
