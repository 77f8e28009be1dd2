//! プロンプトと生成パラメータ
//!
//! CLIとHTTPサーバーで共有される:
//! - ODIA_OCR_PROMPT: Odia文字の書き起こし指示
//! - GenerationParams: 決定的・長さ上限付きの生成設定

use serde::{Deserialize, Serialize};

/// OCR用の固定プロンプト
pub const ODIA_OCR_PROMPT: &str = "Extract all visible Odia (ଓଡ଼ିଆ) text from the image accurately. \n\
Only output the Odia text content. Do not explain or translate anything.\n\
If no Odia text is found, return '[No Odia text found]'.";

/// 生成パラメータ
///
/// 低温度・出力トークン上限付きで、逐語的な書き起こしを狙う。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 2048,
            top_p: 0.8,
            top_k: 40,
        }
    }
}
