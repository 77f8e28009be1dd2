//! Gemini generateContent のリクエスト/レスポンス型
//!
//! 通信そのものは呼び出し側（reqwest）が行う。ここでは
//! リクエストの組み立てとレスポンスからのテキスト抽出のみ。

use crate::error::{Error, Result};
use crate::prompts::GenerationParams;
use serde::{Deserialize, Serialize};

/// Gemini APIリクエスト
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl GeminiRequest {
    /// プロンプト + 画像1枚のリクエストを作成
    ///
    /// # Arguments
    /// * `prompt` - 指示文
    /// * `mime_type` - 画像のMIMEタイプ
    /// * `base64_data` - Base64エンコード済み画像
    /// * `params` - 生成パラメータ
    pub fn with_image(
        prompt: &str,
        mime_type: &str,
        base64_data: &str,
        params: GenerationParams,
    ) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt.to_string() },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: base64_data.to_string(),
                        },
                    },
                ],
            }],
            generation_config: params,
        }
    }
}

/// Gemini APIレスポンス
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: String,
}

/// レスポンスからテキストを取り出す
///
/// 最初の候補の全partを連結する。候補もpartもない場合
/// （安全フィルタでブロックされた等）はエラー。
pub fn extract_text(response: &GeminiResponse) -> Result<String> {
    let parts = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| &c.parts)
        .filter(|parts| !parts.is_empty())
        .ok_or_else(|| Error::Parse("レスポンスにテキストがありません".into()))?;

    Ok(parts.iter().map(|p| p.text.as_str()).collect())
}

/// レスポンスJSON文字列をパースしてテキストを取り出す
pub fn parse_response(body: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(body)?;
    extract_text(&response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = GeminiRequest::with_image("prompt", "image/png", "AAAA", GenerationParams::default());
        let value = serde_json::to_value(&request).unwrap();

        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "prompt");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "AAAA");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_parse_response_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"ଓଡ଼ିଆ "},{"text":"ଭାଷା"}]}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "ଓଡ଼ିଆ ଭାଷା");
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let result = parse_response(body);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_response_candidate_without_content() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert!(parse_response(body).is_err());
    }

    #[test]
    fn test_parse_response_invalid_json() {
        assert!(matches!(parse_response("not json"), Err(Error::Json(_))));
    }
}
