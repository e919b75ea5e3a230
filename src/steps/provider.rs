//! Provider configuration: write, read back, test connectivity.
//!
//! The three checks are independent; a failed write does not stop the read
//! or the connection test.

use serde_json::json;

use crate::client::ApiRequest;
use crate::contract::{field_str, Contract, DataShape, Verdict};
use crate::recorder::Recorder;

use super::{paths, RunContext, StepEnv};

pub const UPDATE_CHECK: &str = "Update provider config";
pub const READ_CHECK: &str = "Get provider config";
pub const TEST_CHECK: &str = "Test provider connection";

pub async fn run(env: &StepEnv<'_>, ctx: RunContext, recorder: &mut Recorder) -> RunContext {
    update(env, &ctx, recorder).await;
    read_back(env, &ctx, recorder).await;
    test_connection(env, &ctx, recorder).await;
    ctx
}

async fn update(env: &StepEnv<'_>, ctx: &RunContext, recorder: &mut Recorder) {
    let provider = &env.config.provider;
    let request = ApiRequest::put(paths::PROVIDERS)
        .with_json(json!({
            "provider": provider.name,
            "base_url": provider.base_url,
            "api_key": provider.api_key,
        }))
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.request());

    match Contract::Envelope.check(&env.send(request).await) {
        Verdict::Pass { .. } => {
            recorder.record(UPDATE_CHECK, true, format!("provider: {}", provider.name))
        }
        Verdict::Fail(cause) => recorder.record(UPDATE_CHECK, false, cause),
    }
}

async fn read_back(env: &StepEnv<'_>, ctx: &RunContext, recorder: &mut Recorder) {
    let provider = &env.config.provider;
    let request = ApiRequest::get(paths::PROVIDERS)
        .with_query("provider", provider.name.as_str())
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.request());

    match Contract::Presence(DataShape::Map).check(&env.send(request).await) {
        Verdict::Pass { payload, .. } => {
            if field_str(&payload, "provider") == Some(provider.name.as_str()) {
                let base_url = field_str(&payload, "base_url").unwrap_or("<unset>");
                recorder.record(READ_CHECK, true, format!("base URL: {}", base_url));
            } else {
                recorder.record(
                    READ_CHECK,
                    false,
                    format!("config returned for a different provider than '{}'", provider.name),
                );
            }
        }
        Verdict::Fail(cause) => {
            recorder.record(READ_CHECK, false, format!("failed to read config: {}", cause))
        }
    }
}

async fn test_connection(env: &StepEnv<'_>, ctx: &RunContext, recorder: &mut Recorder) {
    let request = ApiRequest::post(paths::PROVIDER_TEST)
        .with_json(json!({ "provider": env.config.provider.name }))
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.completion());

    match Contract::Envelope.check(&env.send(request).await) {
        Verdict::Pass { .. } => recorder.record(TEST_CHECK, true, "connection ok"),
        Verdict::Fail(cause) => {
            recorder.record(TEST_CHECK, false, format!("connection failed: {}", cause))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockClient, Reply};
    use crate::client::Method;
    use crate::config::ProbeConfig;

    async fn configure(client: &MockClient) -> (RunContext, Recorder) {
        let config = ProbeConfig::default();
        let env = StepEnv::new(client, &config);
        let mut recorder = Recorder::new();
        let input = RunContext::new().with_token("tok");
        let ctx = run(&env, input.clone(), &mut recorder).await;
        assert_eq!(ctx, input);
        (ctx, recorder)
    }

    #[tokio::test]
    async fn all_three_checks_pass() {
        let client = MockClient::new()
            .on(Method::Put, paths::PROVIDERS, Reply::json(200, json!({"code": 0})))
            .on(
                Method::Get,
                paths::PROVIDERS,
                Reply::json(
                    200,
                    json!({"code": 0, "data": {"provider": "zhipu", "base_url": "http://up/v1"}}),
                ),
            )
            .on(Method::Post, paths::PROVIDER_TEST, Reply::json(200, json!({"code": 0})));

        let (_, recorder) = configure(&client).await;

        let names: Vec<_> = recorder.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![UPDATE_CHECK, READ_CHECK, TEST_CHECK]);
        assert!(recorder.results().iter().all(|r| r.success));
        assert_eq!(recorder.results()[1].details, "base URL: http://up/v1");

        for request in client.requests() {
            assert_eq!(request.bearer.as_deref(), Some("tok"));
        }
    }

    #[tokio::test]
    async fn failed_update_does_not_stop_later_checks() {
        let client = MockClient::new()
            .on(Method::Put, paths::PROVIDERS, Reply::Transport("reset by peer".to_string()))
            .on(
                Method::Get,
                paths::PROVIDERS,
                Reply::json(200, json!({"code": 0, "data": {"provider": "zhipu"}})),
            )
            .on(
                Method::Post,
                paths::PROVIDER_TEST,
                Reply::json(200, json!({"code": 5, "message": "invalid api key"})),
            );

        let (_, recorder) = configure(&client).await;

        assert_eq!(recorder.len(), 3);
        assert!(!recorder.results()[0].success);
        assert!(recorder.results()[1].success);
        assert!(!recorder.results()[2].success);
        assert_eq!(recorder.results()[2].details, "connection failed: invalid api key");
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn read_back_of_other_provider_fails() {
        let client = MockClient::new()
            .on(Method::Put, paths::PROVIDERS, Reply::json(200, json!({"code": 0})))
            .on(
                Method::Get,
                paths::PROVIDERS,
                Reply::json(200, json!({"code": 0, "data": {"provider": "openai"}})),
            )
            .on(Method::Post, paths::PROVIDER_TEST, Reply::json(200, json!({"code": 0})));

        let (_, recorder) = configure(&client).await;
        assert!(!recorder.results()[1].success);
    }
}
