//! Model listing.

use serde_json::Value;

use crate::client::ApiRequest;
use crate::contract::{field_str, Contract, DataShape, Verdict};
use crate::recorder::Recorder;

use super::{paths, RunContext, StepEnv};

pub const CHECK: &str = "List models";

/// Maximum number of model ids named in the detail string.
const LISTED_MODELS: usize = 5;

pub async fn run(env: &StepEnv<'_>, ctx: RunContext, recorder: &mut Recorder) -> RunContext {
    let request = ApiRequest::get(paths::MODELS)
        .with_query("provider", env.config.provider.name.as_str())
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.completion());

    match Contract::Presence(DataShape::List).check(&env.send(request).await) {
        Verdict::Pass { payload, .. } => {
            recorder.record(CHECK, true, describe_models(&payload));
        }
        Verdict::Fail(cause) => recorder.record(
            CHECK,
            false,
            format!("model list is empty or unavailable: {}", cause),
        ),
    }

    ctx
}

fn describe_models(models: &Value) -> String {
    let models = models.as_array().map(Vec::as_slice).unwrap_or_default();
    let names: Vec<&str> = models
        .iter()
        .take(LISTED_MODELS)
        .map(|model| field_str(model, "id").unwrap_or("<no id>"))
        .collect();
    format!("found {} models: {}", models.len(), names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockClient, Reply};
    use crate::client::Method;
    use crate::config::ProbeConfig;
    use serde_json::json;

    async fn list(client: &MockClient) -> Recorder {
        let config = ProbeConfig::default();
        let env = StepEnv::new(client, &config);
        let mut recorder = Recorder::new();
        run(&env, RunContext::new().with_token("tok"), &mut recorder).await;
        recorder
    }

    #[tokio::test]
    async fn names_first_five_models_and_total() {
        let models: Vec<_> = (1..=7).map(|i| json!({"id": format!("m{}", i)})).collect();
        let client = MockClient::new().on(
            Method::Get,
            paths::MODELS,
            Reply::json(200, json!({"code": 0, "data": models})),
        );

        let recorder = list(&client).await;
        let result = &recorder.results()[0];
        assert!(result.success);
        assert_eq!(result.details, "found 7 models: m1, m2, m3, m4, m5");
        assert_eq!(
            client.requests()[0].query,
            vec![("provider".to_string(), "zhipu".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_list_fails() {
        let client = MockClient::new().on(
            Method::Get,
            paths::MODELS,
            Reply::json(200, json!({"data": []})),
        );

        let recorder = list(&client).await;
        let result = &recorder.results()[0];
        assert!(!result.success);
        assert!(result.details.contains("empty"));
    }
}
