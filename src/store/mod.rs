//! アノテーションストア
//!
//! CSV（BOM付きUTF-8）を正とし、同じベースパスの `.json` にミラーを書く。
//! 読み込み時は画像フォルダと照合し、画像のない行を missing として分ける。

mod csv_file;
mod json_mirror;

pub use csv_file::{ensure_annotation_csv, load_annotations, save_annotations_csv, UTF8_BOM};
pub use json_mirror::{json_mirror_path, load_annotations_json, save_annotations_json};

use crate::error::Result;
use odia_ocr_common::{is_failure_sentinel, AnnotationRecord, AnnotationSet};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// CSVとJSONミラーの両方に保存
///
/// JSONを先に書く。どちらかの書き込みに失敗してもロールバックはしない。
pub fn save_annotations(csv_path: &Path, annotations: &AnnotationSet) -> Result<()> {
    let json_path = json_mirror_path(csv_path);
    save_annotations_json(&json_path, annotations)?;
    save_annotations_csv(csv_path, annotations)?;

    info!(
        "アノテーション保存: {}件 → {} / {}",
        annotations.len(),
        csv_path.display(),
        json_path.display()
    );
    Ok(())
}

/// エクスポート要求の2つのマップ（抽出テキスト・校正テキスト）を結合
///
/// 抽出テキスト側のキーが基準。校正テキストがなければ抽出テキストで補完される。
pub fn combine_export(
    extracted: &BTreeMap<String, String>,
    validated: &BTreeMap<String, String>,
) -> AnnotationSet {
    extracted
        .iter()
        .map(|(name, text)| {
            let record = AnnotationRecord::new(text.clone(), validated.get(name).cloned());
            (name.clone(), record)
        })
        .collect()
}

/// OCR結果を既存のアノテーションにマージ
///
/// - 失敗センチネルは無視
/// - 未校正（校正テキスト = 旧抽出テキスト）の場合は校正テキストも更新
/// - 校正済みの場合は校正テキストを保持
///
/// # Returns
/// 更新・追加した件数
pub fn merge_ocr_results(
    annotations: &mut AnnotationSet,
    results: &BTreeMap<String, String>,
) -> usize {
    let mut updated = 0;

    for (name, text) in results {
        if is_failure_sentinel(text) {
            continue;
        }

        match annotations.get_mut(name) {
            Some(record) => {
                if record.validated_text == record.extracted_text {
                    record.validated_text = text.clone();
                }
                record.extracted_text = text.clone();
            }
            None => {
                annotations.insert(name.clone(), AnnotationRecord::new(text.clone(), None));
            }
        }
        updated += 1;
    }

    updated
}
