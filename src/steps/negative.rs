//! Negative-path checks: each request here must be rejected.

use crate::client::ApiRequest;
use crate::contract::{Contract, Verdict};
use crate::recorder::Recorder;

use super::{paths, RunContext, StepEnv};

pub const INVALID_PROVIDER_CHECK: &str = "Invalid provider handling";
pub const UNAUTHORIZED_CHECK: &str = "Unauthorized access handling";

/// Provider name the backend must not know.
const UNKNOWN_PROVIDER: &str = "nonexistent";

pub async fn run(env: &StepEnv<'_>, ctx: RunContext, recorder: &mut Recorder) -> RunContext {
    let invalid_provider = ApiRequest::get(paths::MODELS)
        .with_query("provider", UNKNOWN_PROVIDER)
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.request());
    expect_rejection(env, invalid_provider, INVALID_PROVIDER_CHECK, recorder).await;

    let anonymous = ApiRequest::get(paths::MODELS)
        .with_query("provider", env.config.provider.name.as_str())
        .with_timeout(env.config.timeouts.request());
    expect_rejection(env, anonymous, UNAUTHORIZED_CHECK, recorder).await;

    ctx
}

async fn expect_rejection(env: &StepEnv<'_>, request: ApiRequest, check: &str, recorder: &mut Recorder) {
    match Contract::ExpectError.check(&env.send(request).await) {
        Verdict::Pass { note, .. } => recorder.record(check, true, note),
        Verdict::Fail(cause) => {
            recorder.record(check, false, format!("expected an error: {}", cause))
        }
    }
}
