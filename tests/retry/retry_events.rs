//! Retry notifications observed through the builder hooks.

use crm_api_core::ErrorKind;
use crm_api_executor::{ExecutorLayer, RequestDescriptor, TransportError, TransportResponse};
use crm_api_retry::RetryLayer;
use crm_api_tests::ScriptedTransport;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::{Layer, ServiceExt};

#[tokio::test(start_paused = true)]
async fn retry_then_success_notifications() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (r, s, a) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));

    let transport = ScriptedTransport::new(|_, call| {
        if call == 0 {
            Err(TransportError::Other("reset".to_string()))
        } else {
            Ok(TransportResponse::ok("{}"))
        }
    });
    let executor = ExecutorLayer::builder()
        .on_attempt(move |_, _, attempt| a.lock().unwrap().push(format!("attempt {attempt}")))
        .build()
        .layer(transport);
    let retry = RetryLayer::builder()
        .delay(Duration::from_millis(250))
        .on_retry(move |attempt, delay| {
            r.lock()
                .unwrap()
                .push(format!("retry {attempt} {}ms", delay.as_millis()))
        })
        .on_success(move |attempts| s.lock().unwrap().push(format!("success {attempts}")))
        .build()
        .layer(executor);

    retry.oneshot(RequestDescriptor::get("/x")).await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["attempt 1", "retry 1 250ms", "attempt 2", "success 2"]
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_and_ignored_notifications() {
    let exhausted = Arc::new(Mutex::new(Vec::new()));
    let ignored = Arc::new(Mutex::new(Vec::new()));
    let (e, i) = (Arc::clone(&exhausted), Arc::clone(&ignored));

    let transport = ScriptedTransport::new(|req, _| {
        if req.url.ends_with("/flaky/") {
            Err(TransportError::Other("reset".to_string()))
        } else {
            Ok(TransportResponse::new(404, "Not Found", ""))
        }
    });
    let executor = ExecutorLayer::builder().build().layer(transport);
    let retry = RetryLayer::builder()
        .max_attempts(2)
        .on_exhausted(move |attempts| e.lock().unwrap().push(attempts))
        .on_ignored_error(move |kind| i.lock().unwrap().push(kind))
        .build()
        .layer(executor);

    let _ = retry.clone().oneshot(RequestDescriptor::get("/flaky/")).await;
    let _ = retry.oneshot(RequestDescriptor::get("/missing/")).await;

    assert_eq!(*exhausted.lock().unwrap(), vec![2]);
    assert_eq!(*ignored.lock().unwrap(), vec![ErrorKind::Http]);
}
