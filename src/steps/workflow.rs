//! Project creation followed by a world-building workflow on that project.

use serde_json::json;

use crate::client::ApiRequest;
use crate::contract::{numeric_id, Contract, Verdict};
use crate::recorder::Recorder;

use super::{paths, RunContext, StepEnv};

pub const CREATE_CHECK: &str = "Create project";
pub const WORKFLOW_CHECK: &str = "World-building workflow";

/// Creates a project, then runs the workflow against its id.
///
/// The workflow call is only made once the project id is known; without it
/// the scenario records a single failure. The context only gains the project
/// and session ids when both calls succeed.
pub async fn run(env: &StepEnv<'_>, ctx: RunContext, recorder: &mut Recorder) -> RunContext {
    let project_id = match create_project(env, &ctx, recorder).await {
        Some(id) => id,
        None => return ctx,
    };

    let provider = &env.config.provider;
    let request = ApiRequest::post(paths::WORLD_WORKFLOW)
        .with_json(json!({
            "project_id": project_id,
            "session_title": "World-building probe",
            "prompt": "Create a simple fantasy world setting with a world name and a short description.",
            "provider": provider.name,
            "model": provider.model,
        }))
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.completion());

    match Contract::Envelope.check(&env.send(request).await) {
        Verdict::Pass { payload, .. } => match payload.pointer("/session/id").and_then(numeric_id) {
            Some(session_id) => {
                recorder.record(WORKFLOW_CHECK, true, format!("session id: {}", session_id));
                ctx.with_project_id(project_id).with_session_id(session_id)
            }
            None => {
                recorder.record(WORKFLOW_CHECK, false, "response has no session id");
                ctx
            }
        },
        Verdict::Fail(cause) => {
            recorder.record(WORKFLOW_CHECK, false, cause);
            ctx
        }
    }
}

async fn create_project(env: &StepEnv<'_>, ctx: &RunContext, recorder: &mut Recorder) -> Option<u64> {
    let request = ApiRequest::post(paths::PROJECTS)
        .with_json(json!({
            "title": format!("probe project {}", chrono::Utc::now().timestamp()),
            "description": "Created by backend-probe",
        }))
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.request());

    match Contract::Envelope.check(&env.send(request).await) {
        Verdict::Pass { payload, .. } => match payload.get("id").and_then(numeric_id) {
            Some(id) => {
                recorder.record(CREATE_CHECK, true, format!("project id: {}", id));
                Some(id)
            }
            None => {
                recorder.record(CREATE_CHECK, false, "response has no numeric project id");
                None
            }
        },
        Verdict::Fail(cause) => {
            recorder.record(CREATE_CHECK, false, cause);
            None
        }
    }
}
