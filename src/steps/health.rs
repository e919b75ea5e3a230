//! Service health check.

use crate::client::ApiRequest;
use crate::contract::{field_str, Contract, DataShape, Verdict};
use crate::recorder::Recorder;

use super::{paths, RunContext, StepEnv};

pub const CHECK: &str = "Health check";

/// Probes the health endpoint; `data.status` must equal the expected value.
pub async fn run(env: &StepEnv<'_>, ctx: RunContext, recorder: &mut Recorder) -> RunContext {
    let request = ApiRequest::get(paths::HEALTH).with_timeout(env.config.timeouts.request());
    let outcome = env.send(request).await;
    let expected = env.config.target.expected_health_status.as_str();

    match Contract::Presence(DataShape::Map).check(&outcome) {
        Verdict::Pass { payload, .. } => match field_str(&payload, "status") {
            Some(status) if status == expected => {
                recorder.record(CHECK, true, "service is running");
            }
            Some(status) => recorder.record(
                CHECK,
                false,
                format!("service status is '{}', expected '{}'", status, expected),
            ),
            None => recorder.record(CHECK, false, "health response has no status"),
        },
        Verdict::Fail(cause) => recorder.record(CHECK, false, cause),
    }

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockClient, Reply};
    use crate::client::Method;
    use crate::config::ProbeConfig;
    use serde_json::json;

    async fn probe(client: MockClient) -> Recorder {
        let config = ProbeConfig::default();
        let env = StepEnv::new(&client, &config);
        let mut recorder = Recorder::new();
        let ctx = run(&env, RunContext::new(), &mut recorder).await;
        assert_eq!(ctx, RunContext::new());
        recorder
    }

    #[tokio::test]
    async fn healthy_backend_passes() {
        let client = MockClient::new().on(
            Method::Get,
            paths::HEALTH,
            Reply::json(200, json!({"data": {"status": "ok"}})),
        );
        let recorder = probe(client).await;
        assert_eq!(recorder.len(), 1);
        assert!(recorder.results()[0].success);
    }

    #[tokio::test]
    async fn degraded_status_fails() {
        let client = MockClient::new().on(
            Method::Get,
            paths::HEALTH,
            Reply::json(200, json!({"data": {"status": "degraded"}})),
        );
        let recorder = probe(client).await;
        assert!(!recorder.results()[0].success);
        assert!(recorder.results()[0].details.contains("degraded"));
    }

    #[tokio::test]
    async fn unreachable_backend_fails() {
        let recorder = probe(MockClient::new()).await;
        assert!(!recorder.results()[0].success);
        assert!(recorder.results()[0].details.contains("connection refused"));
    }
}
