//! Request descriptors and their wire form.

use crate::transport::TransportRequest;
use crm_api_core::ApiError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// HTTP verbs the CRM backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical request against the CRM backend.
///
/// `path` is joined onto the executor's base URL. When `body` is present it is
/// sent as JSON text with `Content-Type: application/json`; without a body
/// neither is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
    /// Overrides the executor's default timeout for this request.
    pub timeout: Option<Duration>,
    /// 1-based attempt number within the current logical call.
    pub attempt: usize,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: BTreeMap::new(),
            timeout: None,
            attempt: 1,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets an optional body; `None` clears it.
    pub fn with_optional_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Adds a caller-supplied header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns a copy stamped with `attempt`.
    pub fn with_attempt(mut self, attempt: usize) -> Self {
        self.attempt = attempt;
        self
    }

    /// Same request aimed at another path, used when switching to a fallback
    /// endpoint.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Full URL for `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        join_url(base_url, &self.path)
    }

    /// Builds the exact request handed to the transport.
    ///
    /// The bearer header is attached whenever `token` is present. The body is
    /// serialized once here; nothing downstream re-encodes it.
    pub fn to_transport_request(
        &self,
        base_url: &str,
        token: Option<&str>,
    ) -> Result<TransportRequest, ApiError> {
        let url = self.url(base_url);
        let mut headers = self.headers.clone();

        if let Some(token) = token {
            set_header(&mut headers, "Authorization", format!("Bearer {token}"));
        }

        let body = match &self.body {
            Some(value) => {
                let text = serde_json::to_string(value).map_err(|e| {
                    ApiError::unknown(
                        format!("Failed to serialize request body: {e}"),
                        url.clone(),
                        self.path.clone(),
                    )
                })?;
                set_header(&mut headers, "Content-Type", "application/json".to_string());
                Some(text)
            }
            None => None,
        };

        Ok(TransportRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }
}

/// Header names are case-insensitive, so any caller spelling of `name` is
/// replaced rather than sent alongside.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: String) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}

fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
