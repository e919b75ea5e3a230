//! reqwest-backed client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Error, Result};

use super::{ApiClient, ApiRequest, ApiResponse, BodyMode, Method};

/// HTTP client bound to a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    default_timeout: Duration,
}

impl HttpClient {
    /// Creates a client for `base_url` with a default per-request timeout.
    pub fn new(base_url: impl Into<String>, default_timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("invalid base URL '{}': {}", base_url, e)))?;

        let inner = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            base_url,
            default_timeout,
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn map_send_error(path: &str, timeout: Duration, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                path: path.to_string(),
                timeout,
            }
        } else {
            Error::Transport {
                path: path.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let url = self.url_for(&request.path);

        tracing::debug!(method = %request.method, url = %url, "sending request");

        let mut builder = self
            .inner
            .request(to_reqwest_method(request.method), &url)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_send_error(&request.path, timeout, e))?;
        let status = response.status().as_u16();

        tracing::debug!(path = %request.path, status, "response received");

        if request.mode == BodyMode::StatusOnly {
            return Ok(ApiResponse::empty(status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_send_error(&request.path, timeout, e))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiResponse::empty(status));
        }

        let body = serde_json::from_slice(&bytes).map_err(|e| Error::Decode {
            path: request.path.clone(),
            reason: format!("status {}: {}", status, e),
        })?;

        Ok(ApiResponse::json(status, body))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
