//! Scripted client for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

use super::{ApiClient, ApiRequest, ApiResponse, Method};

/// A canned reply for one route.
#[derive(Debug, Clone)]
pub enum Reply {
    Response(ApiResponse),
    Transport(String),
    Timeout,
    Decode(String),
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Reply::Response(ApiResponse::json(status, body))
    }

    pub fn status(status: u16) -> Self {
        Reply::Response(ApiResponse::empty(status))
    }

    fn into_result(self, path: &str) -> Result<ApiResponse> {
        match self {
            Reply::Response(response) => Ok(response),
            Reply::Transport(reason) => Err(Error::Transport {
                path: path.to_string(),
                reason,
            }),
            Reply::Timeout => Err(Error::Timeout {
                path: path.to_string(),
                timeout: Duration::from_secs(1),
            }),
            Reply::Decode(reason) => Err(Error::Decode {
                path: path.to_string(),
                reason,
            }),
        }
    }
}

/// Client that answers from a per-route script and records every request.
///
/// Routes are keyed by method, path and the presence of a bearer token so
/// authenticated and anonymous calls to the same endpoint can differ. The
/// last reply queued for a route is repeated once the queue drains.
#[derive(Default)]
pub struct MockClient {
    routes: Mutex<HashMap<RouteKey, Vec<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    method: Method,
    path: String,
    query: Option<String>,
    authenticated: Option<bool>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for any request to `method path`.
    pub fn on(self, method: Method, path: &str, reply: Reply) -> Self {
        self.push(
            RouteKey {
                method,
                path: path.to_string(),
                query: None,
                authenticated: None,
            },
            reply,
        )
    }

    /// Queues a reply for requests whose query string equals `query` (`k=v&k2=v2`).
    pub fn on_query(self, method: Method, path: &str, query: &str, reply: Reply) -> Self {
        self.push(
            RouteKey {
                method,
                path: path.to_string(),
                query: Some(query.to_string()),
                authenticated: None,
            },
            reply,
        )
    }

    /// Queues a reply for requests without a bearer token.
    pub fn on_anonymous(self, method: Method, path: &str, reply: Reply) -> Self {
        self.push(
            RouteKey {
                method,
                path: path.to_string(),
                query: None,
                authenticated: Some(false),
            },
            reply,
        )
    }

    fn push(self, key: RouteKey, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push(reply);
        self
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the paths of every request sent so far.
    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    fn next_reply(&self, request: &ApiRequest) -> Option<Reply> {
        let query = request
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let authenticated = request.bearer.is_some();

        let candidates = [
            RouteKey {
                method: request.method,
                path: request.path.clone(),
                query: Some(query.clone()),
                authenticated: None,
            },
            RouteKey {
                method: request.method,
                path: request.path.clone(),
                query: None,
                authenticated: Some(authenticated),
            },
            RouteKey {
                method: request.method,
                path: request.path.clone(),
                query: None,
                authenticated: None,
            },
        ];

        let mut routes = self.routes.lock().unwrap();
        for key in candidates {
            if let Some(queue) = routes.get_mut(&key) {
                if queue.len() > 1 {
                    return Some(queue.remove(0));
                }
                return queue.first().cloned();
            }
        }
        None
    }
}

#[async_trait]
impl ApiClient for MockClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match self.next_reply(&request) {
            Some(reply) => reply.into_result(&request.path),
            None => Err(Error::Transport {
                path: request.path.clone(),
                reason: "connection refused".to_string(),
            }),
        }
    }

    fn base_url(&self) -> &str {
        "http://mock.invalid"
    }
}
