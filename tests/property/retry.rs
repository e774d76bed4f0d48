//! Property tests for the retry coordinator.
//!
//! Invariants tested:
//! - Never exceeds max_attempts
//! - Succeeds on first success
//! - Only UNKNOWN failures are retried

use crm_api_executor::{ExecutorLayer, RequestDescriptor, TransportError, TransportResponse};
use crm_api_retry::RetryLayer;
use crm_api_tests::ScriptedTransport;
use proptest::prelude::*;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tower::{Layer, ServiceExt};

fn paused_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Unknown,
    Network,
    Http,
}

fn failure() -> impl Strategy<Value = Failure> {
    prop_oneof![
        Just(Failure::Unknown),
        Just(Failure::Network),
        Just(Failure::Http)
    ]
}

fn answer(failure: Failure) -> Result<TransportResponse, TransportError> {
    match failure {
        Failure::Unknown => Err(TransportError::Other("reset".to_string())),
        Failure::Network => Err(TransportError::Connect("refused".to_string())),
        Failure::Http => Ok(TransportResponse::new(500, "Internal Server Error", "")),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: the transport sees at most max_attempts calls, stopping at
    /// the first success or the first non-retryable failure
    #[test]
    fn attempts_are_bounded(
        max_attempts in 1usize..=6,
        script in proptest::collection::vec(proptest::option::of(failure()), 0..8),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let steps = script.clone();
            let transport = ScriptedTransport::new(move |_, call| match steps.get(call) {
                Some(Some(failure)) => answer(*failure),
                _ => Ok(TransportResponse::ok("{}")),
            });
            let executor = ExecutorLayer::builder().build().layer(transport.clone());
            let retry = RetryLayer::builder()
                .max_attempts(max_attempts)
                .delay(Duration::from_millis(5))
                .build()
                .layer(executor);

            let result = retry.oneshot(RequestDescriptor::get("/api/x/")).await;

            let steps: Vec<Option<Failure>> = (0..max_attempts)
                .map(|i| script.get(i).copied().flatten())
                .collect();
            let stop = steps
                .iter()
                .position(|step| !matches!(step, Some(Failure::Unknown)));
            prop_assert_eq!(transport.calls(), stop.map_or(max_attempts, |i| i + 1));

            match stop.map(|i| steps[i]) {
                Some(None) => {
                    prop_assert!(result.is_ok());
                }
                Some(Some(_)) => {
                    let err = result.unwrap_err();
                    prop_assert!(!err.is_unknown());
                    prop_assert!(err.context().attempts.is_none());
                }
                None => {
                    let err = result.unwrap_err();
                    prop_assert!(err.is_unknown());
                    prop_assert_eq!(err.context().attempts, Some(max_attempts));
                }
            }

            Ok(())
        })?;
    }
}
