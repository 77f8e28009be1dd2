//! Gemini API連携（generateContent REST）

use super::{RecognitionRequest, TextRecognizer};
use crate::error::{OdiaOcrError, Result};
use async_trait::async_trait;
use odia_ocr_common::gemini::{parse_response, GeminiRequest};
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(model: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_base_url(GEMINI_API_BASE, model, timeout)
    }

    /// 接続先を差し替える（ローカルのモックサーバー等）
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextRecognizer for GeminiClient {
    async fn recognize(&self, request: &RecognitionRequest) -> Result<String> {
        let body = GeminiRequest::with_image(
            &request.prompt,
            request.mime_type,
            &request.image_base64,
            request.params,
        );

        debug!("Gemini呼び出し: model={} mime={}", self.model, request.mime_type);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &request.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OdiaOcrError::ApiCall(format!(
                "Gemini API error {}: {}",
                status, text
            )));
        }

        let payload = response.text().await?;
        parse_response(&payload).map_err(|e| OdiaOcrError::ApiParse(e.to_string()))
    }
}
