use mockito::Matcher;
use reviewscope::llm::gemini::GeminiProvider;
use reviewscope::llm::{LlmProvider, LlmRequest};

const PATH: &str = "/gemini-1.5-flash:generateContent";

#[tokio::test]
async fn test_gemini_generate_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "fake-key".into()))
        .match_body(Matcher::PartialJsonString(
            r#"{"generationConfig": {"topK": 40, "maxOutputTokens": 512}}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r###"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "## 핵심 강점\n넓은 놀이 공간"}]
                    },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 120,
                    "candidatesTokenCount": 30,
                    "totalTokenCount": 150
                },
                "modelVersion": "gemini-1.5-flash-002"
            }"###,
        )
        .create_async()
        .await;

    let provider = GeminiProvider::new(server.url(), "fake-key", "gemini-1.5-flash");
    let request = LlmRequest {
        max_tokens: Some(512),
        ..LlmRequest::new("전략을 작성해주세요")
    };

    let response = provider.generate(request).await.expect("generate");

    assert_eq!(response.content, "## 핵심 강점\n넓은 놀이 공간");
    assert_eq!(response.usage.prompt_tokens, 120);
    assert_eq!(response.usage.completion_tokens, 30);
    assert_eq!(response.usage.total_tokens, 150);
    assert_eq!(response.model, "gemini-1.5-flash-002");
    assert_eq!(provider.model_name(), "gemini-1.5-flash");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_error_status() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error": {"message": "API key not valid"}}"#)
        .create_async()
        .await;

    let provider = GeminiProvider::new(server.url(), "bad-key", "gemini-1.5-flash");
    let err = provider
        .generate(LlmRequest::new("Test"))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("403"));
    assert!(message.contains("API key not valid"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_response_without_text() {
    let mut server = mockito::Server::new_async().await;

    // blocked prompts come back without candidates
    let mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
        .create_async()
        .await;

    let provider = GeminiProvider::new(server.url(), "fake-key", "gemini-1.5-flash");
    let err = provider
        .generate(LlmRequest::new("Test"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no generated text"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_body_stall_times_out() {
    let mut server = mockito::Server::new_async().await;

    // headers go out at once, the body only after the deadline
    let _mock = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(br#"{"candidates": []}"#)
        })
        .create_async()
        .await;

    let provider = GeminiProvider::new(server.url(), "fake-key", "gemini-1.5-flash");
    let request = LlmRequest {
        timeout_seconds: Some(1),
        ..LlmRequest::new("Test")
    };

    let started = std::time::Instant::now();
    let err = provider.generate(request).await.unwrap_err();

    assert!(format!("{:#}", err).contains("Gemini request timed out after 1s"));
    assert!(started.elapsed() < std::time::Duration::from_millis(2500));
}
