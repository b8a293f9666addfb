//! End-to-end client tests against a mock OpenAI-compatible server.
//!
//! These cover the synchronous modalities (chat, image, speech) plus model
//! listing: the wire shape on the way out, decoding on the way back, and the
//! client-level retry, caching, and warning behavior in between. Response
//! bodies follow the official OpenAI API reference.

use std::time::Duration;

use anygen::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client wired to the mock server through the built-in `openai` profile.
fn client_for(server: &MockServer) -> GenClient {
    GenClient::builder("openai")
        .unwrap()
        .base_url(server.uri())
        .api_key("test-api-key")
        .build()
        .unwrap()
}

fn chat_completion_body() -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello! How can I help you today?"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21}
    })
}

fn model_listing_body() -> serde_json::Value {
    json!({
        "object": "list",
        "data": [
            {"id": "gpt-4o", "object": "model", "owned_by": "openai"},
            {"id": "dall-e-3", "object": "model", "owned_by": "openai"},
            {"id": "sora-2", "object": "model", "owned_by": "openai"}
        ]
    })
}

#[tokio::test]
async fn chat_round_trip_decodes_the_first_choice() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "Hello!"}],
            "temperature": 0.7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = GenerationRequest::text("gpt-4o", vec![ChatMessage::user("Hello!")])
        .temperature(0.7)
        .build()
        .unwrap();

    let response = client.chat(&request).await.unwrap();
    assert_eq!(response.text(), Some("Hello! How can I help you today?"));
    assert!(response.warnings.is_empty());
    assert!(!response.request_id.is_nil());

    let result = response.result.as_text().unwrap();
    assert_eq!(result.model.as_deref(), Some("gpt-4o"));
    assert_eq!(result.usage.as_ref().unwrap().total_tokens, Some(21));
}

#[tokio::test]
async fn unsupported_options_are_dropped_and_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = GenerationRequest::text("gpt-4o", vec![ChatMessage::user("Hello!")])
        .option("mirostat", 2)
        .build()
        .unwrap();

    let response = client.chat(&request).await.unwrap();
    assert_eq!(
        response.warnings,
        vec![NormalizationWarning::Dropped {
            field: "mirostat".to_string()
        }]
    );

    // The dropped field must never reach the wire.
    let sent = &server.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
    assert!(body.get("mirostat").is_none());
}

#[tokio::test]
async fn image_round_trip_decodes_the_data_array() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({
            "model": "dall-e-3",
            "prompt": "a lighthouse at dusk",
            "size": "1024x1024"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1700000000,
            "data": [{
                "url": "https://cdn.example.com/img-1.png",
                "revised_prompt": "A lighthouse at dusk, oil on canvas"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = GenerationRequest::image("a lighthouse at dusk")
        .model("dall-e-3")
        .size("1024x1024")
        .build()
        .unwrap();

    let response = client.generate_image(&request).await.unwrap();
    let images = response.images().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(
        images[0].url.as_deref(),
        Some("https://cdn.example.com/img-1.png")
    );
    assert_eq!(
        images[0].revised_prompt.as_deref(),
        Some("A lighthouse at dusk, oil on canvas")
    );
}

#[tokio::test]
async fn speech_round_trip_returns_labeled_audio() {
    let server = MockServer::start().await;
    let audio = b"ID3\x04\x00\x00\x00\x00\x00\x00fake mp3 payload".to_vec();

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(body_partial_json(json!({
            "model": "tts-1",
            "input": "It is pitch black.",
            "voice": "onyx",
            "response_format": "mp3"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(audio.clone())
                .insert_header("Content-Type", "audio/mpeg"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = GenerationRequest::speech("tts-1", "It is pitch black.", "onyx")
        .response_format("mp3")
        .build()
        .unwrap();

    let response = client.generate_speech(&request).await.unwrap();
    assert_eq!(response.audio(), Some(audio.as_slice()));
    let result = response.result.as_speech().unwrap();
    assert_eq!(result.format.as_deref(), Some("mp3"));
}

#[tokio::test]
async fn client_errors_are_classified_and_never_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = GenerationRequest::text("gpt-4o", vec![ChatMessage::user("Hello!")])
        .build()
        .unwrap();

    let error = client.chat(&request).await.unwrap_err();
    assert!(matches!(error, GenError::AuthenticationError(_)));
    assert_eq!(error.category(), ErrorCategory::Authentication);
    assert_eq!(error.status_code(), Some(401));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn transient_listing_failures_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "internal error"}
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_listing_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = GenClient::builder("openai")
        .unwrap()
        .base_url(server.uri())
        .api_key("test-api-key")
        .retry_policy(
            RetryPolicy::new()
                .with_max_attempts(3)
                .with_initial_delay(Duration::from_millis(10))
                .with_jitter(false),
        )
        .build()
        .unwrap();

    let listing = client.list_models().await.unwrap();
    assert_eq!(listing.models.len(), 3);
    assert!(!listing.stale);
}

#[tokio::test]
async fn model_listings_are_cached_between_calls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("Authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_listing_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.list_models().await.unwrap();
    let second = client.list_models().await.unwrap();
    assert_eq!(first.models, second.models);

    let videos = filter_by_capability(&first.models, ModelCapability::Video);
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "sora-2");
}

#[tokio::test]
async fn force_refresh_bypasses_the_cached_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_listing_body()))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.list_models().await.unwrap();
    client
        .list_models_with(FetchOptions::new().with_force_refresh(true))
        .await
        .unwrap();
}

#[tokio::test]
async fn wrong_modality_requests_fail_before_any_network_call() {
    let server = MockServer::start().await;
    // No mocks mounted: a request reaching the server would 404 loudly.

    let client = client_for(&server);
    let request = GenerationRequest::image("a lighthouse at dusk").build().unwrap();

    let error = client.chat(&request).await.unwrap_err();
    assert!(matches!(error, GenError::InvalidInput(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
