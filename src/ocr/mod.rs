//! OCRディスパッチャ
//!
//! 画像ごとに外部の文字認識APIを呼び出し、結果をファイル名ごとに集約する。
//! 画像単位の失敗はセンチネル文字列として結果に残し、バッチ全体は失敗させない。

mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use odia_ocr_common::{
    is_plain_file_name, mime_type_for, ocr_failed, GenerationParams, IMAGE_NOT_FOUND, IMAGE_NOT_PROCESSED,
    NO_TEXT_EXTRACTED, ODIA_OCR_PROMPT,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

/// 文字認識に渡す1画像分の入力
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    /// Base64エンコード済み画像
    pub image_base64: String,
    pub mime_type: &'static str,
    pub prompt: String,
    pub params: GenerationParams,
    /// 呼び出しごとに渡され、保存されない
    pub api_key: String,
}

/// 外部の文字認識
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, request: &RecognitionRequest) -> Result<String>;
}

/// 固定間隔のリトライ設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大試行回数（初回を含む）
    pub max_attempts: u32,
    /// 試行間の待ち時間
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// 画像ファイルを読み込んでBase64に変換
pub fn encode_image(image_path: &Path) -> Result<String> {
    let bytes = std::fs::read(image_path)?;
    Ok(STANDARD.encode(bytes))
}

/// 空白のみのレスポンスをセンチネルに置き換え
fn normalize_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        NO_TEXT_EXTRACTED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 1枚をOCR（リトライ付き）
///
/// 非対応形式・読み込み失敗は `[Image could not be processed]`（リトライなし）。
/// 認識APIの失敗は `policy.delay` 待ってから再試行し、使い切ったら
/// 試行回数と最後のエラーを含むセンチネルを返す。
pub async fn recognize_image(
    recognizer: &dyn TextRecognizer,
    image_path: &Path,
    api_key: &str,
    policy: &RetryPolicy,
) -> String {
    let Some(mime_type) = mime_type_for(image_path) else {
        warn!("非対応の画像形式: {}", image_path.display());
        return IMAGE_NOT_PROCESSED.to_string();
    };

    let image_base64 = match encode_image(image_path) {
        Ok(data) => data,
        Err(e) => {
            error!("画像の読み込みに失敗 {}: {}", image_path.display(), e);
            return IMAGE_NOT_PROCESSED.to_string();
        }
    };

    let request = RecognitionRequest {
        image_base64,
        mime_type,
        prompt: ODIA_OCR_PROMPT.to_string(),
        params: GenerationParams::default(),
        api_key: api_key.to_string(),
    };

    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match recognizer.recognize(&request).await {
            Ok(text) => {
                info!("OCR完了: {}", image_path.display());
                return normalize_text(&text);
            }
            Err(e) => {
                warn!(
                    "OCR試行 {}/{} 失敗 {}: {}",
                    attempt,
                    max_attempts,
                    image_path.display(),
                    e
                );
                if attempt >= max_attempts {
                    return ocr_failed(max_attempts, &e.to_string());
                }
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

/// 複数画像を順番にOCR
///
/// 結果は入力のファイル名をすべてキーに持つ（重複は1件にまとまる）。
pub async fn recognize_batch(
    recognizer: &dyn TextRecognizer,
    filenames: &[String],
    image_dir: &Path,
    api_key: &str,
    policy: &RetryPolicy,
) -> BTreeMap<String, String> {
    recognize_batch_with_progress(recognizer, filenames, image_dir, api_key, policy, |_, _| {}).await
}

/// `recognize_batch` と同じ。1枚終わるごとに `on_item(ファイル名, 結果)` を呼ぶ
pub async fn recognize_batch_with_progress<F>(
    recognizer: &dyn TextRecognizer,
    filenames: &[String],
    image_dir: &Path,
    api_key: &str,
    policy: &RetryPolicy,
    mut on_item: F,
) -> BTreeMap<String, String>
where
    F: FnMut(&str, &str) + Send,
{
    let mut results = BTreeMap::new();
    info!("バッチOCR開始: {}枚", filenames.len());

    for filename in filenames {
        let image_path = image_dir.join(filename);

        // フォルダ外を指す名前は読まない
        let text = if is_plain_file_name(filename) && image_path.exists() {
            recognize_image(recognizer, &image_path, api_key, policy).await
        } else {
            error!("画像が見つかりません: {}", image_path.display());
            IMAGE_NOT_FOUND.to_string()
        };

        on_item(filename, &text);
        results.insert(filename.clone(), text);
    }

    info!("バッチOCR完了");
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  ଓଡ଼ିଆ \n"), "ଓଡ଼ିଆ");
        assert_eq!(normalize_text(""), NO_TEXT_EXTRACTED);
        assert_eq!(normalize_text(" \n\t "), NO_TEXT_EXTRACTED);
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_encode_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"hello").unwrap();
        assert_eq!(encode_image(&path).unwrap(), "aGVsbG8=");
    }

    #[test]
    fn test_encode_missing_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(encode_image(&dir.path().join("none.png")).is_err());
    }
}
