//! GeminiClient のテスト
//!
//! ローカルに立てたモックサーバーへ接続し、リクエスト形式とエラー変換を検証

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use odia_ocr_common::{GenerationParams, ODIA_OCR_PROMPT};
use odia_ocr_rust::error::OdiaOcrError;
use odia_ocr_rust::ocr::{GeminiClient, RecognitionRequest, TextRecognizer};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// モックが受け取ったリクエスト
#[derive(Default)]
struct Captured {
    model_path: Option<String>,
    api_key: Option<String>,
    body: Option<Value>,
}

#[derive(Clone)]
struct MockState {
    captured: Arc<Mutex<Captured>>,
    status: StatusCode,
    reply: Value,
}

async fn generate_content(
    State(state): State<MockState>,
    UrlPath(model_path): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    {
        let mut captured = state.captured.lock().unwrap();
        captured.model_path = Some(model_path);
        captured.api_key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.body = Some(body);
    }
    (state.status, Json(state.reply.clone()))
}

/// モックサーバーを起動してベースURLを返す
async fn spawn_mock(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Captured>>) {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let state = MockState {
        captured: captured.clone(),
        status,
        reply,
    };

    let app = Router::new()
        .route("/v1beta/models/:model_path", post(generate_content))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1beta", addr), captured)
}

fn sample_request() -> RecognitionRequest {
    RecognitionRequest {
        image_base64: "aGVsbG8=".to_string(),
        mime_type: "image/png",
        prompt: ODIA_OCR_PROMPT.to_string(),
        params: GenerationParams::default(),
        api_key: "test-key".to_string(),
    }
}

#[tokio::test]
async fn test_recognize_success() {
    let reply = json!({
        "candidates": [
            { "content": { "parts": [ { "text": "ଓଡ଼ିଆ " }, { "text": "ଭାଷା" } ] } }
        ]
    });
    let (base_url, captured) = spawn_mock(StatusCode::OK, reply).await;

    let client = GeminiClient::with_base_url(base_url, "gemini-1.5-flash", Duration::from_secs(5)).unwrap();
    let text = client.recognize(&sample_request()).await.unwrap();

    assert_eq!(text, "ଓଡ଼ିଆ ଭାଷା");

    let captured = captured.lock().unwrap();
    assert_eq!(captured.model_path.as_deref(), Some("gemini-1.5-flash:generateContent"));
    // APIキーはURLではなくヘッダーで渡す
    assert_eq!(captured.api_key.as_deref(), Some("test-key"));

    let body = captured.body.as_ref().unwrap();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], ODIA_OCR_PROMPT);
    assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    assert_eq!(parts[1]["inline_data"]["data"], "aGVsbG8=");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    assert_eq!(body["generationConfig"]["topK"], 40);
}

/// 非2xxは ApiCall（ステータスを含む）
#[tokio::test]
async fn test_recognize_server_error() {
    let reply = json!({ "error": { "message": "overloaded" } });
    let (base_url, _) = spawn_mock(StatusCode::SERVICE_UNAVAILABLE, reply).await;

    let client = GeminiClient::with_base_url(base_url, "gemini-1.5-flash", Duration::from_secs(5)).unwrap();
    let err = client.recognize(&sample_request()).await.unwrap_err();

    match err {
        OdiaOcrError::ApiCall(message) => {
            assert!(message.contains("503"));
            assert!(message.contains("overloaded"));
        }
        other => panic!("ApiCall になるべき: {:?}", other),
    }
}

/// 候補なしは ApiParse
#[tokio::test]
async fn test_recognize_without_candidates() {
    let (base_url, _) = spawn_mock(StatusCode::OK, json!({ "candidates": [] })).await;

    let client = GeminiClient::with_base_url(base_url, "gemini-1.5-flash", Duration::from_secs(5)).unwrap();
    let err = client.recognize(&sample_request()).await.unwrap_err();

    assert!(matches!(err, OdiaOcrError::ApiParse(_)));
}
