//! HTTP client adapter for the backend under test.
//!
//! Every call is a single attempt bounded by a timeout. Steps talk to the
//! backend only through the [`ApiClient`] trait so they can be exercised
//! against a scripted client in tests.

pub mod http;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpClient;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// HTTP methods used by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    /// Returns the canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the response body should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// Buffer the body and decode it as JSON.
    #[default]
    Json,
    /// Only look at the status code; the body is never read.
    StatusOnly,
}

/// A single request against the backend.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the client's base URL (e.g. `/api/v1/auth/login`).
    pub path: String,
    /// Query string pairs.
    pub query: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Optional bearer token.
    pub bearer: Option<String>,
    /// Per-request timeout, overriding the client default.
    pub timeout: Option<Duration>,
    /// Body handling.
    pub mode: BodyMode,
}

impl ApiRequest {
    /// Creates a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
            timeout: None,
            mode: BodyMode::default(),
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Creates a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Adds a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches a bearer token, if one is available.
    pub fn with_bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_string);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Skips reading the response body.
    pub fn status_only(mut self) -> Self {
        self.mode = BodyMode::StatusOnly;
        self
    }
}

/// A response from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body; `None` for an empty body or a status-only request.
    pub body: Option<Value>,
}

impl ApiResponse {
    /// Creates a response with a decoded JSON body.
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// Creates a response without a body.
    pub fn empty(status: u16) -> Self {
        Self { status, body: None }
    }

    /// Returns true for a 2xx status.
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for clients that can reach the backend under test.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Sends the request once and returns the response.
    ///
    /// Network failures and timeouts are [`Error::Transport`]/[`Error::Timeout`];
    /// a non-empty body that is not JSON is [`Error::Decode`].
    ///
    /// [`Error::Transport`]: crate::Error::Transport
    /// [`Error::Timeout`]: crate::Error::Timeout
    /// [`Error::Decode`]: crate::Error::Decode
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;

    /// Returns the base URL requests are resolved against.
    fn base_url(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builder_sets_fields() {
        let request = ApiRequest::post("/api/v1/ai/proxy")
            .with_query("provider", "zhipu")
            .with_json(json!({"a": 1}))
            .with_bearer(Some("tok"))
            .with_timeout(Duration::from_secs(5))
            .status_only();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path, "/api/v1/ai/proxy");
        assert_eq!(request.query, vec![("provider".to_string(), "zhipu".to_string())]);
        assert_eq!(request.body, Some(json!({"a": 1})));
        assert_eq!(request.bearer.as_deref(), Some("tok"));
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
        assert_eq!(request.mode, BodyMode::StatusOnly);
    }

    #[test]
    fn missing_bearer_stays_none() {
        let request = ApiRequest::get("/healthz").with_bearer(None);
        assert!(request.bearer.is_none());
        assert_eq!(request.mode, BodyMode::Json);
    }

    #[test]
    fn success_status_range() {
        assert!(ApiResponse::empty(200).is_success_status());
        assert!(ApiResponse::empty(204).is_success_status());
        assert!(!ApiResponse::empty(401).is_success_status());
    }
}
