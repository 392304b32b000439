//! HTTP-level tests for the Gemini client against a mock server.

use serde_json::json;
use std::time::Duration;
use studio_pro::{EncodedImage, GeminiClient, GeminiModel, GenerationClient, Status, StudioController, StudioError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .prompt("Studio shot please")
        .build()
        .expect("client")
}

fn photo() -> EncodedImage {
    EncodedImage::new("image/jpeg", b"casual photo".to_vec()).unwrap()
}

fn image_response(mime: &str, data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": {"parts": [{"inlineData": {"mimeType": mime, "data": data}}]},
            "finishReason": "STOP"
        }]
    }))
}

#[tokio::test]
async fn generate_sends_photo_and_returns_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseModalities": ["IMAGE"]}
        })))
        .respond_with(image_response("image/png", "c3R1ZGlv"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let shot = client.generate(&photo(), "image/jpeg").await.unwrap();
    assert_eq!(shot.media_type(), "image/png");
    assert_eq!(shot.bytes(), b"studio");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[0]["inlineData"]["data"], photo().to_base64());
    assert_eq!(parts[1]["text"], "Studio shot please");
}

#[tokio::test]
async fn every_call_reaches_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(image_response("image/png", "c3R1ZGlv"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.generate(&photo(), "image/jpeg").await.unwrap();
    client.generate(&photo(), "image/jpeg").await.unwrap();
}

#[tokio::test]
async fn selected_model_is_in_the_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/nano-banana-pro-preview:generateContent"))
        .respond_with(image_response("image/png", "c3R1ZGlv"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .model(GeminiModel::NanoBananaPro)
        .build()
        .unwrap();
    client.generate(&photo(), "image/jpeg").await.unwrap();
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&photo(), "image/jpeg")
        .await
        .unwrap_err();
    match err {
        StudioError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(30)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn forbidden_maps_to_auth_with_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&photo(), "image/jpeg")
        .await
        .unwrap_err();
    match err {
        StudioError::Auth(message) => assert_eq!(message, "API key not valid"),
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_maps_to_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&photo(), "image/jpeg")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "API error: 500 - backend unavailable");
}

#[tokio::test]
async fn blocked_prompt_maps_to_content_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "OTHER"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&photo(), "image/jpeg")
        .await
        .unwrap_err();
    match err {
        StudioError::ContentBlocked(message) => assert_eq!(message, "Prompt blocked: OTHER"),
        other => panic!("expected ContentBlocked, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&photo(), "image/jpeg")
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::Json(_)), "got {err:?}");
    assert!(!err.is_retryable());
    assert_eq!(err.retry_after(), None);
}

#[tokio::test]
async fn payment_required_maps_to_billing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {"code": 402, "message": "Billing account missing"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&photo(), "image/jpeg")
        .await
        .unwrap_err();
    match err {
        StudioError::Billing(message) => assert!(message.contains("enable billing"), "{message}"),
        other => panic!("expected Billing, got {other:?}"),
    }
}

#[tokio::test]
async fn safety_wording_maps_to_content_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Request blocked by safety", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(&photo(), "image/jpeg")
        .await
        .unwrap_err();
    match err {
        StudioError::ContentBlocked(message) => assert_eq!(message, "Request blocked by safety"),
        other => panic!("expected ContentBlocked, got {other:?}"),
    }
}

#[tokio::test]
async fn health_check_reports_missing_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models/gemini-2.5-flash-image"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client_for(&server).health_check().await.unwrap_err();
    assert!(matches!(err, StudioError::InvalidRequest(_)));
}

#[tokio::test]
async fn health_check_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models/gemini-2.5-flash-image"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "models/gemini-2.5-flash-image"})))
        .mount(&server)
        .await;

    client_for(&server).health_check().await.unwrap();
}

#[tokio::test]
async fn upload_generate_download_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"inlineData": {"mimeType": "image/jpeg"}}]}]
        })))
        .respond_with(image_response("image/png", "c3R1ZGlv"))
        .expect(1)
        .mount(&server)
        .await;

    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("studio_pro_scenario_{suffix}"));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("photo.jpg");
    std::fs::write(&input, b"casual photo").unwrap();

    let mut controller = StudioController::new(client_for(&server));
    controller.select_file(&input).unwrap();
    assert_eq!(controller.session().media_type(), "image/jpeg");

    let result = match controller.generate().await {
        Status::Success(result) => result.clone(),
        other => panic!("expected success, got {other:?}"),
    };
    assert_eq!(result.source_image.bytes(), b"casual photo");
    assert_eq!(result.produced_image.to_data_url(), "data:image/png;base64,c3R1ZGlv");

    let saved = controller.download(dir.join("out")).unwrap();
    assert_eq!(
        saved.file_name().unwrap().to_string_lossy(),
        format!("studio-pro-{}.png", result.produced_at.timestamp_millis())
    );
    assert_eq!(std::fs::read(&saved).unwrap(), b"studio");

    std::fs::remove_dir_all(dir).unwrap();
}
