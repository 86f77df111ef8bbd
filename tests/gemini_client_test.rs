//! HTTP-level tests for the Gemini client against a mock server.

use futures::StreamExt;
use mockito::Matcher;

use plotweave::domain::models::{GeneratorConfig, RateLimitConfig, RetryConfig};
use plotweave::domain::ports::{GenerationRequest, TextGenerator};
use plotweave::infrastructure::gemini::{GeminiApiError, GeminiClient};

const MODEL: &str = "gemini-3-flash-preview";

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
    }
}

fn client(server: &mockito::Server, retry: RetryConfig) -> GeminiClient {
    let generator = GeneratorConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.url(),
        ..GeneratorConfig::default()
    };
    let rate_limit = RateLimitConfig {
        requests_per_second: 1000.0,
    };
    GeminiClient::new(&generator, &retry, &rate_limit).unwrap()
}

fn candidates_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
    .to_string()
}

#[tokio::test]
async fn test_generate_parses_candidate_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", format!("/v1beta/models/{MODEL}:generateContent").as_str())
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidates_body("夜色渐深，林风握紧了剑。"))
        .create_async()
        .await;

    let client = client(&server, fast_retry());
    let text = client
        .generate(GenerationRequest::new("写一段开头"))
        .await
        .unwrap();
    assert_eq!(text, "夜色渐深，林风握紧了剑。");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_quota_exhaustion_fails_without_retry() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", format!("/v1beta/models/{MODEL}:generateContent").as_str())
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error":{"message":"Resource has been exhausted"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client(&server, fast_retry());
    let err = client
        .generate(GenerationRequest::new("继续"))
        .await
        .unwrap_err();
    let api_err = err.downcast_ref::<GeminiApiError>().unwrap();
    assert!(matches!(api_err, GeminiApiError::QuotaExceeded));
    // Exactly one request: quota exhaustion must not be retried.
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_errors_retried_until_exhausted() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", format!("/v1beta/models/{MODEL}:generateContent").as_str())
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal")
        .expect(3)
        .create_async()
        .await;

    let client = client(&server, fast_retry());
    let err = client
        .generate(GenerationRequest::new("继续"))
        .await
        .unwrap_err();
    let api_err = err.downcast_ref::<GeminiApiError>().unwrap();
    assert!(api_err.is_transient());
    // Initial attempt plus max_retries.
    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_key_is_permanent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", format!("/v1beta/models/{MODEL}:generateContent").as_str())
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"error":{"message":"API key not valid"}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client(&server, fast_retry());
    let err = client
        .generate(GenerationRequest::new("继续"))
        .await
        .unwrap_err();
    let api_err = err.downcast_ref::<GeminiApiError>().unwrap();
    assert!(api_err.is_permanent());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_check_quota_reports_unavailable_on_429() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", format!("/v1beta/models/{MODEL}:generateContent").as_str())
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("quota")
        .create_async()
        .await;

    let client = client(&server, fast_retry());
    let status = client.check_quota().await.unwrap();
    assert!(!status.available);
    assert_eq!(status.model, MODEL);
    assert!(status.message.contains("配额"));
}

#[tokio::test]
async fn test_check_quota_available_on_success() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", format!("/v1beta/models/{MODEL}:generateContent").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(candidates_body("ok"))
        .create_async()
        .await;

    let client = client(&server, fast_retry());
    let status = client.check_quota().await.unwrap();
    assert!(status.available);
}

#[tokio::test]
async fn test_stream_yields_deltas_in_order() {
    let sse_body = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"夜色\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"渐深，\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"林风独行。\"}]}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock(
            "POST",
            format!("/v1beta/models/{MODEL}:streamGenerateContent").as_str(),
        )
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body)
        .create_async()
        .await;

    let client = client(&server, fast_retry());
    let mut stream = client
        .generate_stream(GenerationRequest::new("继续"))
        .await
        .unwrap();

    let mut deltas = Vec::new();
    while let Some(delta) = stream.next().await {
        deltas.push(delta.unwrap());
    }
    assert_eq!(deltas, vec!["夜色", "渐深，", "林风独行。"]);
}

#[tokio::test]
async fn test_stream_error_status_surfaces_before_any_delta() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock(
            "POST",
            format!("/v1beta/models/{MODEL}:streamGenerateContent").as_str(),
        )
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("quota")
        .create_async()
        .await;

    let client = client(&server, fast_retry());
    let err = match client.generate_stream(GenerationRequest::new("继续")).await {
        Ok(_) => panic!("expected generate_stream to fail"),
        Err(err) => err,
    };
    let api_err = err.downcast_ref::<GeminiApiError>().unwrap();
    assert!(matches!(api_err, GeminiApiError::QuotaExceeded));
}
