//! Integration tests for the AI providers using wiremock HTTP mocks.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use trendhunt_ai::{
    build_provider, AiBudget, AiClient, AiError, AnthropicProvider, CompletionProvider,
    CompletionRequest, OpenAiProvider, OpenRouterProvider, ParseMode, ProviderOptions, RateLimit,
    RetryPolicy, SchemaHint,
};
use trendhunt_core::config::DEFAULT_SITE_URL;
use trendhunt_core::AiProviderKind;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn schema() -> SchemaHint {
    SchemaHint {
        name: "ReviewFindings".to_owned(),
        schema: json!({
            "type": "object",
            "properties": { "problem_solved": { "type": "string" } }
        }),
    }
}

fn request(schema: &SchemaHint) -> CompletionRequest<'_> {
    CompletionRequest {
        system: "You analyse product reviews.",
        prompt: "Reviews: love it",
        schema,
        max_tokens: 1024,
    }
}

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content } }
        ],
        "usage": { "prompt_tokens": 42, "completion_tokens": 7 }
    })
}

#[tokio::test]
async fn openai_sends_json_schema_and_reads_usage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_tokens": 1024,
            "response_format": {
                "type": "json_schema",
                "json_schema": { "name": "ReviewFindings" }
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply("{\"problem_solved\": \"slow mornings\"}")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("sk-test", TIMEOUT)
        .expect("client construction should not fail")
        .with_base_url(&server.uri());
    let hint = schema();
    let reply = provider.send(&request(&hint)).await.expect("should reply");

    assert_eq!(reply.text, "{\"problem_solved\": \"slow mornings\"}");
    assert_eq!(reply.usage.input_tokens, 42);
    assert_eq!(reply.usage.output_tokens, 7);
}

#[tokio::test]
async fn openrouter_uses_json_object_mode_and_attribution_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("x-title", "trendhunt"))
        .and(header("http-referer", "https://trendhunt.example"))
        .and(body_partial_json(json!({
            "model": "nvidia/nemotron-nano-9b-v2:free",
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenRouterProvider::new("or-key", TIMEOUT)
        .expect("client construction should not fail")
        .with_site_url("https://trendhunt.example")
        .with_base_url(&server.uri());
    let hint = schema();
    provider.send(&request(&hint)).await.expect("should reply");
}

#[tokio::test]
async fn openrouter_sends_default_referer_without_site_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("x-title", "trendhunt"))
        .and(header("http-referer", DEFAULT_SITE_URL))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenRouterProvider::new("or-key", TIMEOUT)
        .expect("client construction should not fail")
        .with_base_url(&server.uri());
    let hint = schema();
    provider.send(&request(&hint)).await.expect("should reply");
}

#[tokio::test]
async fn built_openrouter_client_sends_attribution_and_configured_max_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer or-key"))
        .and(header("x-title", "trendhunt"))
        .and(header("http-referer", "https://shop.example"))
        .and(body_partial_json(json!({
            "model": "meta-llama/llama-3.3-8b-instruct:free",
            "max_tokens": 512
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_reply("{\"problem_solved\": \"tangled cables\"}")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let provider = build_provider(
        AiProviderKind::OpenRouter,
        "or-key",
        &ProviderOptions {
            model_override: Some("meta-llama/llama-3.3-8b-instruct:free"),
            site_url: "https://shop.example",
            base_url: Some(&uri),
            timeout: TIMEOUT,
        },
    )
    .expect("client construction should not fail");
    let budget = Arc::new(
        AiBudget::new(RateLimit {
            requests_per_minute: 600,
            max_wait: Duration::from_secs(5),
        })
        .with_request_ceiling(4),
    );
    let client = AiClient::new(provider, budget, RetryPolicy::default()).with_max_tokens(512);
    assert_eq!(client.provider_name(), "openrouter");
    assert_eq!(client.budget().request_ceiling(), Some(4));

    let completion = client
        .complete("sys", "prompt", &schema())
        .await
        .expect("should reply");

    assert_eq!(
        completion.text("problem_solved", 200).as_deref(),
        Some("tangled cables")
    );
    assert_eq!(client.usage().requests, 1);
}

#[tokio::test]
async fn anthropic_sends_version_header_and_joins_text_blocks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({ "model": "claude-sonnet-4-20250514" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                { "type": "thinking", "thinking": "hmm" },
                { "type": "text", "text": "{\"problem_solved\":" },
                { "type": "text", "text": " \"clutter\"}" }
            ],
            "usage": { "input_tokens": 100, "output_tokens": 20 }
        })))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new("ak-test", TIMEOUT)
        .expect("client construction should not fail")
        .with_base_url(&server.uri());
    let hint = schema();
    let reply = provider.send(&request(&hint)).await.expect("should reply");

    assert_eq!(reply.text, "{\"problem_solved\": \"clutter\"}");
    assert_eq!(reply.usage.input_tokens, 100);
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("bad", TIMEOUT)
        .expect("client construction should not fail")
        .with_base_url(&server.uri());
    let hint = schema();
    let err = provider.send(&request(&hint)).await.unwrap_err();

    assert!(matches!(
        err,
        AiError::Auth {
            provider: "openai",
            status: 401
        }
    ));
}

#[tokio::test]
async fn rate_limited_response_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let provider = OpenRouterProvider::new("k", TIMEOUT)
        .expect("client construction should not fail")
        .with_base_url(&server.uri());
    let hint = schema();
    let err = provider.send(&request(&hint)).await.unwrap_err();

    assert!(matches!(
        err,
        AiError::RateLimited {
            retry_after_secs: Some(7),
            ..
        }
    ));
}

#[tokio::test]
async fn empty_choices_is_an_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("k", TIMEOUT)
        .expect("client construction should not fail")
        .with_base_url(&server.uri());
    let hint = schema();
    let err = provider.send(&request(&hint)).await.unwrap_err();

    assert!(matches!(err, AiError::EmptyResponse { provider: "openai" }));
}

#[tokio::test]
async fn client_retries_server_errors_then_parses_prose_wrapped_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(
            "Here is the analysis:\n{\"problem_solved\": \"soggy fries\"}\nLet me know!",
        )))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("k", TIMEOUT)
        .expect("client construction should not fail")
        .with_base_url(&server.uri());
    let budget = Arc::new(AiBudget::new(RateLimit {
        requests_per_minute: 600,
        max_wait: Duration::from_secs(5),
    }));
    let client = AiClient::new(
        Arc::new(provider),
        budget,
        RetryPolicy {
            max_retries: 2,
            backoff_base_ms: 1,
        },
    );

    let completion = client
        .complete("sys", "prompt", &schema())
        .await
        .expect("second attempt should succeed");

    assert_eq!(completion.mode, ParseMode::Extracted);
    assert_eq!(
        completion.text("problem_solved", 200).as_deref(),
        Some("soggy fries")
    );
    let usage = client.usage();
    assert_eq!(usage.requests, 2);
    assert_eq!(usage.failures, 1);
}
