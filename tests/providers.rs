//! Provider client tests against a local mock server.

use batchforge::{ChatModel, GenerationParams, GoogleClient, OpenAiClient, Provider};
use httpmock::prelude::*;
use serde_json::json;

#[test]
fn google_structured_invoke_sends_schema_constraint() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/gemini-1.5-flash:generateContent")
            .query_param("key", "test-key")
            .json_body_partial(
                r#"{
                    "generationConfig": {
                        "temperature": 0.0,
                        "responseMimeType": "application/json"
                    }
                }"#,
            );
        then.status(200).json_body(json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"result\": \"ok\"}"}]}}
            ]
        }));
    });

    let client = GoogleClient::new("test-key", GenerationParams::for_provider(Provider::Google))
        .with_base_url(server.base_url());
    let schema = json!({"type": "object", "required": ["result"]});
    let value = client
        .generate_structured("Answer briefly.", "Q: foo", &schema)
        .unwrap();

    mock.assert();
    assert_eq!(value, json!({"result": "ok"}));
}

#[test]
fn google_structured_invoke_rejects_non_json_reply() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(json!({
            "candidates": [
                {"content": {"parts": [{"text": "not json at all"}]}}
            ]
        }));
    });

    let client = GoogleClient::new("test-key", GenerationParams::for_provider(Provider::Google))
        .with_base_url(server.base_url());
    let err = client
        .generate_structured("s", "u", &json!({"type": "object"}))
        .unwrap_err();

    assert!(err.to_string().contains("decode structured output"));
}

#[test]
fn google_client_error_is_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST);
        then.status(400).json_body(json!({
            "error": {"message": "API key not valid"}
        }));
    });

    let client = GoogleClient::new("bad-key", GenerationParams::for_provider(Provider::Google))
        .with_base_url(server.base_url());
    let err = client
        .generate_structured("s", "u", &json!({"type": "object"}))
        .unwrap_err();

    assert!(err.to_string().contains("API key not valid"));
    mock.assert_hits(1);
}

#[test]
fn google_server_error_exhausts_retry_budget() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST);
        then.status(503).body("overloaded");
    });

    let client = GoogleClient::new("test-key", GenerationParams::for_provider(Provider::Google))
        .with_base_url(server.base_url());
    let err = client.generate_text("hello").unwrap_err();

    assert!(err.to_string().contains("Provider error"));
    // Two retries on top of the initial attempt.
    mock.assert_hits(3);
}

#[test]
fn google_text_invoke_returns_raw_reply() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(json!({
            "candidates": [
                {"content": {"parts": [{"text": "plain text reply"}]}}
            ]
        }));
    });

    let client = GoogleClient::new("test-key", GenerationParams::for_provider(Provider::Google))
        .with_base_url(server.base_url());

    assert_eq!(client.generate_text("hi").unwrap(), "plain text reply");
}

#[test]
fn openai_structured_invoke_sends_json_schema_format() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer test-key")
            .json_body_partial(
                r#"{
                    "model": "gpt-3.5-turbo",
                    "temperature": 0.0,
                    "response_format": {"type": "json_schema"}
                }"#,
            );
        then.status(200).json_body(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"result\": \"ok\"}"}}
            ]
        }));
    });

    let client = OpenAiClient::new("test-key", GenerationParams::for_provider(Provider::OpenAi))
        .with_base_url(server.base_url());
    let schema = json!({"type": "object", "required": ["result"]});
    let value = client
        .generate_structured("Answer briefly.", "Q: foo", &schema)
        .unwrap();

    mock.assert();
    assert_eq!(value, json!({"result": "ok"}));
}

#[test]
fn openai_error_body_message_is_surfaced() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST);
        then.status(401).json_body(json!({
            "error": {"message": "Incorrect API key provided"}
        }));
    });

    let client = OpenAiClient::new("bad-key", GenerationParams::for_provider(Provider::OpenAi))
        .with_base_url(server.base_url());
    let err = client.generate_text("hi").unwrap_err();

    assert!(err.to_string().contains("Incorrect API key provided"));
}

#[test]
fn openai_text_invoke_omits_response_format() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .matches(|req| {
                let body = req.body.clone().unwrap_or_default();
                let body = String::from_utf8_lossy(&body);
                !body.contains("response_format")
            });
        then.status(200).json_body(json!({
            "choices": [
                {"message": {"role": "assistant", "content": "plain"}}
            ]
        }));
    });

    let client = OpenAiClient::new("test-key", GenerationParams::for_provider(Provider::OpenAi))
        .with_base_url(server.base_url());

    assert_eq!(client.generate_text("hi").unwrap(), "plain");
    mock.assert();
}
