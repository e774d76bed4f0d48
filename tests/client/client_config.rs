//! Client configuration.

use crm_api::{ApiClient, ApiClientConfig, ConfigError};
use crm_api_tests::ScriptedTransport;
use std::collections::HashMap;
use std::time::Duration;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn variables_feed_every_layer() {
    let config = ApiClientConfig::from_lookup(vars(&[
        ("CRM_API_URL", "https://crm.example.com"),
        ("CRM_API_TIMEOUT_MS", "2500"),
        ("CRM_API_RETRY_ATTEMPTS", "5"),
        ("CRM_API_RETRY_DELAY_MS", "200"),
    ]))
    .unwrap();

    let client = ApiClient::builder()
        .config(config)
        .build_with_transport(ScriptedTransport::ok("{}"))
        .unwrap();
    let stack = client.request_service();

    assert_eq!(stack.config().max_attempts(), 5);
    assert_eq!(stack.config().delay(), Duration::from_millis(200));
    assert_eq!(stack.get_ref().config().base_url(), "https://crm.example.com");
    assert_eq!(
        stack.get_ref().config().default_timeout(),
        Duration::from_millis(2500)
    );
    assert_eq!(stack.config().name(), "crm-api");
}

#[test]
fn bad_number_names_the_variable() {
    let err = ApiClientConfig::from_lookup(vars(&[("CRM_API_TIMEOUT_MS", "soon")])).unwrap_err();
    assert_eq!(
        err,
        ConfigError::InvalidNumber {
            var: "CRM_API_TIMEOUT_MS",
            value: "soon".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        r#"CRM_API_TIMEOUT_MS must be a non-negative integer, got "soon""#
    );
}

#[test]
fn builder_rejects_non_http_base_url() {
    let result = ApiClient::builder()
        .base_url("ftp://crm.example.com")
        .build_with_transport(ScriptedTransport::ok("{}"));
    assert!(matches!(result, Err(ConfigError::InvalidBaseUrl(url)) if url == "ftp://crm.example.com"));
}

#[test]
fn config_deserializes_from_json() {
    let config: ApiClientConfig =
        serde_json::from_str(r#"{"base_url":"http://10.0.0.2:8000","retry_attempts":1}"#).unwrap();
    assert_eq!(config.base_url, "http://10.0.0.2:8000");
    assert_eq!(config.retry_attempts, 1);
    assert_eq!(config.timeout(), Duration::from_secs(10));
}
