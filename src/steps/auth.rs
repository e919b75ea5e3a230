//! Login.
//!
//! The only step whose failure ends the run: every later step needs the
//! token it produces.

use serde_json::json;

use crate::client::ApiRequest;
use crate::contract::{field_str, Contract, Verdict};
use crate::recorder::Recorder;

use super::{paths, RunContext, StepEnv};

pub const CHECK: &str = "Login";

/// Logs in with the configured credentials.
///
/// Returns the context carrying the token on success, or the input context
/// unchanged on any failure.
pub async fn run(env: &StepEnv<'_>, ctx: RunContext, recorder: &mut Recorder) -> RunContext {
    let credentials = &env.config.credentials;
    let request = ApiRequest::post(paths::LOGIN)
        .with_json(json!({
            "username": credentials.username,
            "password": credentials.password,
        }))
        .with_timeout(env.config.timeouts.request());

    let outcome = env.send(request).await;

    let data = match Contract::Envelope.check(&outcome) {
        Verdict::Pass { payload, .. } => payload,
        Verdict::Fail(cause) => {
            recorder.record(CHECK, false, format!("login failed: {}", cause));
            return ctx;
        }
    };

    if !data.is_object() {
        recorder.record(CHECK, false, "malformed response: no data field");
        return ctx;
    }

    match field_str(&data, "token") {
        Some(token) if !token.is_empty() => {
            recorder.record(
                CHECK,
                true,
                format!("token acquired ({})", credentials.username),
            );
            ctx.with_token(token)
        }
        _ => {
            recorder.record(CHECK, false, "no token in response");
            ctx
        }
    }
}
