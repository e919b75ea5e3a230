//! Probe steps.
//!
//! Each step drives one scenario against the backend, judges the responses
//! with a [`Contract`](crate::contract::Contract), records one result per
//! check, and hands back the [`RunContext`] for the next step.

pub mod auth;
pub mod chat;
pub mod health;
pub mod models;
pub mod negative;
pub mod provider;
pub mod workflow;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, ApiRequest};
use crate::config::ProbeConfig;
use crate::contract::StepOutcome;
use crate::recorder::Recorder;

/// Backend endpoints exercised by the probe.
pub mod paths {
    pub const HEALTH: &str = "/healthz";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const PROVIDERS: &str = "/api/v1/ai/providers";
    pub const PROVIDER_TEST: &str = "/api/v1/ai/providers/test";
    pub const MODELS: &str = "/api/v1/ai/models";
    pub const PROXY: &str = "/api/v1/ai/proxy";
    pub const PROXY_STREAM: &str = "/api/v1/ai/proxy/stream";
    pub const PROJECTS: &str = "/api/v1/projects/";
    pub const WORLD_WORKFLOW: &str = "/api/v1/workflows/world";

    /// Upstream path the proxy forwards chat requests to.
    pub const UPSTREAM_CHAT: &str = "/v1/chat/completions";
}

/// A scenario in the fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    HealthCheck,
    Authenticate,
    ConfigureProvider,
    ListModels,
    Chat,
    StreamChat,
    Workflow,
    ErrorHandling,
    Report,
}

impl Step {
    /// Every step, in execution order.
    pub const ORDER: [Step; 9] = [
        Step::HealthCheck,
        Step::Authenticate,
        Step::ConfigureProvider,
        Step::ListModels,
        Step::Chat,
        Step::StreamChat,
        Step::Workflow,
        Step::ErrorHandling,
        Step::Report,
    ];

    /// Returns the `snake_case` identifier used in config and on the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::HealthCheck => "health_check",
            Step::Authenticate => "authenticate",
            Step::ConfigureProvider => "configure_provider",
            Step::ListModels => "list_models",
            Step::Chat => "chat",
            Step::StreamChat => "stream_chat",
            Step::Workflow => "workflow",
            Step::ErrorHandling => "error_handling",
            Step::Report => "report",
        }
    }

    /// Returns the console heading for the scenario.
    pub fn title(&self) -> &'static str {
        match self {
            Step::HealthCheck => "Service health check",
            Step::Authenticate => "User login",
            Step::ConfigureProvider => "AI provider configuration",
            Step::ListModels => "AI model listing",
            Step::Chat => "AI chat completion",
            Step::StreamChat => "AI streaming chat",
            Step::Workflow => "Project workflow",
            Step::ErrorHandling => "Error handling",
            Step::Report => "Report",
        }
    }

    /// Returns true if the step always runs, whatever the skip list says.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, Step::Authenticate | Step::Report)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Step::ORDER
            .iter()
            .copied()
            .find(|step| step.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<_> = Step::ORDER.iter().map(Step::as_str).collect();
                format!("unknown step '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// State carried from step to step.
///
/// Steps never mutate a context in place; the `with_*` methods consume it
/// and return the successor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    token: Option<String>,
    project_id: Option<u64>,
    session_id: Option<u64>,
}

impl RunContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bearer token from the login step.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the id of the project created by the workflow step.
    pub fn project_id(&self) -> Option<u64> {
        self.project_id
    }

    /// Returns the session id produced by the workflow invocation.
    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    /// Returns true once a token has been obtained.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self
        }
    }

    pub fn with_project_id(self, project_id: u64) -> Self {
        Self {
            project_id: Some(project_id),
            ..self
        }
    }

    pub fn with_session_id(self, session_id: u64) -> Self {
        Self {
            session_id: Some(session_id),
            ..self
        }
    }
}

/// Collaborators every step needs.
pub struct StepEnv<'a> {
    /// Client for the backend under test.
    pub client: &'a dyn ApiClient,
    /// Probe configuration.
    pub config: &'a ProbeConfig,
}

impl<'a> StepEnv<'a> {
    pub fn new(client: &'a dyn ApiClient, config: &'a ProbeConfig) -> Self {
        Self { client, config }
    }

    /// Sends a request, logging transport and decode failures.
    pub(crate) async fn send(&self, request: ApiRequest) -> StepOutcome {
        let method = request.method;
        let path = request.path.clone();
        let outcome = self.client.send(request).await;
        match &outcome {
            Ok(response) => {
                tracing::debug!(method = %method, path = %path, status = response.status, "call completed")
            }
            Err(err) => tracing::warn!(
                method = %method,
                path = %path,
                unreachable = err.is_transport(),
                error = %err,
                "call failed"
            ),
        }
        outcome
    }
}

/// Runs one probing step and returns the successor context.
///
/// [`Step::Report`] is not a probe and leaves the context untouched.
pub async fn run_step(
    step: Step,
    env: &StepEnv<'_>,
    ctx: RunContext,
    recorder: &mut Recorder,
) -> RunContext {
    match step {
        Step::HealthCheck => health::run(env, ctx, recorder).await,
        Step::Authenticate => auth::run(env, ctx, recorder).await,
        Step::ConfigureProvider => provider::run(env, ctx, recorder).await,
        Step::ListModels => models::run(env, ctx, recorder).await,
        Step::Chat => chat::run(env, ctx, recorder).await,
        Step::StreamChat => chat::run_stream(env, ctx, recorder).await,
        Step::Workflow => workflow::run(env, ctx, recorder).await,
        Step::ErrorHandling => negative::run(env, ctx, recorder).await,
        Step::Report => ctx,
    }
}
