//! Chat completion through the backend's AI proxy, plain and streaming.

use serde_json::{json, Value};

use crate::client::ApiRequest;
use crate::contract::{field_str, Contract, Verdict};
use crate::recorder::Recorder;

use super::{paths, RunContext, StepEnv};

pub const CHAT_CHECK: &str = "Chat completion";
pub const STREAM_CHECK: &str = "Streaming chat";

/// Characters of the reply shown in the log preview.
const PREVIEW_CHARS: usize = 80;

/// Sends a chat completion and expects the provider's native response shape.
pub async fn run(env: &StepEnv<'_>, ctx: RunContext, recorder: &mut Recorder) -> RunContext {
    let provider = &env.config.provider;
    let request = ApiRequest::post(paths::PROXY)
        .with_json(proxy_body(
            &provider.name,
            json!({
                "model": provider.model,
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "Hello, please introduce yourself briefly."},
                ],
                "temperature": 0.7,
                "max_tokens": 200,
            }),
        ))
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.completion());

    match Contract::RawProxy.check(&env.send(request).await) {
        Verdict::Pass { payload, .. } => {
            let content = payload
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let model = field_str(&payload, "model").unwrap_or("unknown");

            tracing::info!(model = %model, preview = %preview(content, PREVIEW_CHARS), "chat reply");
            recorder.record(
                CHAT_CHECK,
                true,
                format!("model: {}, response length: {}", model, content.chars().count()),
            );
        }
        Verdict::Fail(cause) => recorder.record(CHAT_CHECK, false, cause),
    }

    ctx
}

/// Sends a streaming chat request; only the status code is judged.
pub async fn run_stream(env: &StepEnv<'_>, ctx: RunContext, recorder: &mut Recorder) -> RunContext {
    let provider = &env.config.provider;
    let request = ApiRequest::post(paths::PROXY_STREAM)
        .with_json(proxy_body(
            &provider.name,
            json!({
                "model": provider.model,
                "messages": [
                    {"role": "user", "content": "Describe the beauty of spring in one sentence."},
                ],
                "stream": true,
                "max_tokens": 100,
            }),
        ))
        .with_bearer(ctx.token())
        .with_timeout(env.config.timeouts.stream())
        .status_only();

    match Contract::StatusOnly.check(&env.send(request).await) {
        Verdict::Pass { .. } => recorder.record(STREAM_CHECK, true, "stream accepted"),
        Verdict::Fail(cause) => recorder.record(STREAM_CHECK, false, cause),
    }

    ctx
}

fn proxy_body(provider: &str, body: Value) -> Value {
    json!({
        "provider": provider,
        "path": paths::UPSTREAM_CHAT,
        "body": body,
    })
}

/// Truncates `text` to `max` characters, marking the cut with `...`.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockClient, Reply};
    use crate::client::{BodyMode, Method};
    use crate::config::ProbeConfig;

    async fn drive(client: &MockClient, stream: bool) -> Recorder {
        let config = ProbeConfig::default();
        let env = StepEnv::new(client, &config);
        let mut recorder = Recorder::new();
        let ctx = RunContext::new().with_token("tok");
        if stream {
            run_stream(&env, ctx, &mut recorder).await;
        } else {
            run(&env, ctx, &mut recorder).await;
        }
        recorder
    }

    #[tokio::test]
    async fn proxied_reply_passes_with_model_and_length() {
        let client = MockClient::new().on(
            Method::Post,
            paths::PROXY,
            Reply::json(
                200,
                json!({"choices": [{"message": {"content": "hello"}}], "model": "glm-4.7"}),
            ),
        );

        let recorder = drive(&client, false).await;
        let result = &recorder.results()[0];
        assert!(result.success);
        assert!(result.details.contains("glm-4.7"));
        assert!(result.details.contains("response length: 5"));

        let sent = &client.requests()[0];
        let body = sent.body.as_ref().unwrap();
        assert_eq!(body["provider"], "zhipu");
        assert_eq!(body["path"], paths::UPSTREAM_CHAT);
        assert_eq!(body["body"]["model"], "glm-4.7");
        assert_eq!(sent.timeout, Some(ProbeConfig::default().timeouts.completion()));
    }

    #[tokio::test]
    async fn wrapped_reply_without_choices_fails() {
        let client = MockClient::new().on(
            Method::Post,
            paths::PROXY,
            Reply::json(200, json!({"code": 0, "data": {"content": "hello"}})),
        );

        let recorder = drive(&client, false).await;
        assert!(!recorder.results()[0].success);
        assert!(recorder.results()[0].details.contains("no choices"));
    }

    #[tokio::test]
    async fn timeout_fails_chat() {
        let client = MockClient::new().on(Method::Post, paths::PROXY, Reply::Timeout);
        let recorder = drive(&client, false).await;
        assert!(!recorder.results()[0].success);
        assert!(recorder.results()[0].details.contains("timed out"));
    }

    #[tokio::test]
    async fn stream_passes_on_200_without_reading_body() {
        let client = MockClient::new().on(Method::Post, paths::PROXY_STREAM, Reply::status(200));

        let recorder = drive(&client, true).await;
        assert!(recorder.results()[0].success);

        let sent = &client.requests()[0];
        assert_eq!(sent.mode, BodyMode::StatusOnly);
        assert_eq!(sent.body.as_ref().unwrap()["body"]["stream"], true);
    }

    #[tokio::test]
    async fn stream_fails_on_other_status() {
        let client = MockClient::new().on(Method::Post, paths::PROXY_STREAM, Reply::status(502));
        let recorder = drive(&client, true).await;
        assert!(!recorder.results()[0].success);
        assert_eq!(recorder.results()[0].details, "status code: 502");
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(preview("short", 80), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("春天很美丽", 2), "春天...");
    }
}
