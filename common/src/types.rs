//! アノテーションの型定義
//!
//! CLIとHTTPサーバーで共有される型:
//! - AnnotationRecord: 1画像分の抽出テキストと校正済みテキスト
//! - AnnotationSet: ファイル名 → AnnotationRecord
//! - Reconciliation: CSVと画像フォルダの照合結果

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// CSVの列名
pub const COLUMN_IMAGE_FILENAME: &str = "image_filename";
pub const COLUMN_EXTRACTED_TEXT: &str = "extracted_text";
pub const COLUMN_VALIDATED_TEXT: &str = "validated_text";

/// CSVヘッダー（列順固定）
pub const CSV_HEADER: [&str; 3] = [
    COLUMN_IMAGE_FILENAME,
    COLUMN_EXTRACTED_TEXT,
    COLUMN_VALIDATED_TEXT,
];

/// 1画像分のアノテーション
///
/// `validated_text` が空の場合は `extracted_text` で補完される。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAnnotationRecord")]
pub struct AnnotationRecord {
    /// OCRの出力
    pub extracted_text: String,

    /// 人手で校正したテキスト
    pub validated_text: String,

    /// クライアントが付加したその他のメタデータ（JSONミラーにのみ保存）
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationRecord {
    pub fn new(extracted_text: impl Into<String>, validated_text: Option<String>) -> Self {
        let extracted_text = extracted_text.into();
        let validated_text = validated_text
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| extracted_text.clone());

        Self {
            extracted_text,
            validated_text,
            extra: Map::new(),
        }
    }
}

#[derive(Deserialize)]
struct RawAnnotationRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    extracted_text: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    validated_text: Option<String>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawAnnotationRecord> for AnnotationRecord {
    fn from(raw: RawAnnotationRecord) -> Self {
        let mut record = AnnotationRecord::new(raw.extracted_text.unwrap_or_default(), raw.validated_text);
        record.extra = raw.extra;
        record
    }
}

/// 文字列以外（数値・真偽値）も文字列として受け付ける
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(value_to_text(&other)),
    })
}

/// JSON値をテキスト表現に変換
///
/// 数値は `1.5` のような素のJSON数値表記になる。
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// ファイル名 → アノテーション
///
/// BTreeMapなのでCSVの行順・JSONのキー順は常にファイル名順で安定する。
pub type AnnotationSet = BTreeMap<String, AnnotationRecord>;

/// CSVと画像フォルダの照合結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// 画像が存在するアノテーション
    pub annotations: AnnotationSet,

    /// 画像が存在したファイル名（CSVの出現順）
    pub valid_images: Vec<String>,

    /// CSVにあるが画像が存在しないファイル名（CSVの出現順）
    pub missing_images: Vec<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.valid_images.is_empty() && self.missing_images.is_empty()
    }

    /// CSVの総行数
    pub fn total(&self) -> usize {
        self.valid_images.len() + self.missing_images.len()
    }
}
