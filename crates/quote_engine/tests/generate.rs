use std::time::Duration;

use pretty_assertions::assert_eq;
use quote_engine::{
    GeminiClient, GenerationFailure, GeneratorSettings, QuoteGenerator, MAX_PROMPT_CHARS,
    NO_RESPONSE_SENTINEL,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    let settings = GeneratorSettings {
        endpoint: format!("{}{}", server.uri(), MODEL_PATH),
        ..GeneratorSettings::default()
    };
    GeminiClient::new(settings).expect("client")
}

fn generated(text: &str) -> Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
    })
}

#[tokio::test]
async fn successful_response_is_split_into_quotes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(query_param("key", "secret-key"))
        .and(body_partial_json(json!({ "generationConfig": { "temperature": 0.2 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated(
            "*Quote one* *Quote two*  ",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let quotes = client_for(&server)
        .generate_quotes("Quote one. Quote two.", "secret-key")
        .await
        .expect("quotes");
    assert_eq!(quotes, vec!["Quote one".to_string(), "Quote two".to_string()]);
}

#[tokio::test]
async fn prompt_embeds_truncated_excerpt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated("* ok")))
        .mount(&server)
        .await;

    let long_text = format!("{}{}", "a".repeat(MAX_PROMPT_CHARS), "TAIL");
    client_for(&server)
        .generate_quotes(&long_text, "k")
        .await
        .expect("quotes");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body
        .pointer("/contents/0/parts/0/text")
        .and_then(Value::as_str)
        .unwrap();
    assert!(prompt.ends_with(&"a".repeat(MAX_PROMPT_CHARS)));
    assert!(!prompt.contains("TAIL"));
    assert!(prompt.contains("exactly as it appears"));
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": { "message": "invalid key" } })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_quotes("text", "bad")
        .await
        .unwrap_err();
    assert_eq!(err.kind, GenerationFailure::HttpStatus(400));
    assert_eq!(err.message, "invalid key");
}

#[tokio::test]
async fn error_without_message_uses_generic_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_quotes("text", "k")
        .await
        .unwrap_err();
    assert_eq!(err.kind, GenerationFailure::HttpStatus(503));
    assert_eq!(err.message, "Request failed");
}

#[tokio::test]
async fn missing_generated_text_yields_sentinel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let quotes = client_for(&server)
        .generate_quotes("text", "k")
        .await
        .expect("soft failure");
    assert_eq!(quotes, vec![NO_RESPONSE_SENTINEL.to_string()]);
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_quotes("text", "k")
        .await
        .unwrap_err();
    assert_eq!(err.kind, GenerationFailure::MalformedBody);
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(generated("* late")),
        )
        .mount(&server)
        .await;

    let settings = GeneratorSettings {
        endpoint: format!("{}{}", server.uri(), MODEL_PATH),
        request_timeout: Duration::from_millis(50),
        ..GeneratorSettings::default()
    };
    let err = GeminiClient::new(settings)
        .unwrap()
        .generate_quotes("text", "secret-key")
        .await
        .unwrap_err();
    assert_eq!(err.kind, GenerationFailure::Timeout);
    assert!(!err.message.contains("secret-key"));
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(generated(&"x".repeat(512))))
        .mount(&server)
        .await;

    let settings = GeneratorSettings {
        endpoint: format!("{}{}", server.uri(), MODEL_PATH),
        max_response_bytes: 64,
        ..GeneratorSettings::default()
    };
    let err = GeminiClient::new(settings)
        .unwrap()
        .generate_quotes("text", "k")
        .await
        .unwrap_err();
    assert_eq!(err.kind, GenerationFailure::TooLarge { max_bytes: 64 });
}

#[tokio::test]
async fn invalid_endpoint_fails_before_network() {
    let settings = GeneratorSettings {
        endpoint: "not a url".to_string(),
        ..GeneratorSettings::default()
    };
    let err = GeminiClient::new(settings)
        .unwrap()
        .generate_quotes("text", "k")
        .await
        .unwrap_err();
    assert_eq!(err.kind, GenerationFailure::InvalidEndpoint);
}
