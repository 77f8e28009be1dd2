//! アノテーションCSVの読み書き

use crate::error::{OdiaOcrError, Result};
use odia_ocr_common::types::{
    COLUMN_EXTRACTED_TEXT, COLUMN_IMAGE_FILENAME, COLUMN_VALIDATED_TEXT, CSV_HEADER,
};
use odia_ocr_common::{is_plain_file_name, AnnotationRecord, AnnotationSet, Reconciliation};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// 表計算ソフトでOdia文字が化けないようCSV先頭に付ける
pub const UTF8_BOM: &str = "\u{feff}";

/// CSVを読み込み、画像フォルダと照合
///
/// - CSVがなければ空の結果（エラーではない）
/// - `image_filename` 列がなければ `MalformedCsv`
/// - 画像がある行 → annotations と valid_images（出現順）
/// - 画像がない行 → missing_images のみ（テキストは破棄）
pub fn load_annotations(csv_path: &Path, image_dir: &Path) -> Result<Reconciliation> {
    if !csv_path.exists() {
        debug!("アノテーションCSVなし: {}", csv_path.display());
        return Ok(Reconciliation::default());
    }

    let content = std::fs::read_to_string(csv_path)?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let filename_idx = column(COLUMN_IMAGE_FILENAME).ok_or_else(|| {
        OdiaOcrError::MalformedCsv(format!("CSVに '{}' 列がありません", COLUMN_IMAGE_FILENAME))
    })?;
    let extracted_idx = column(COLUMN_EXTRACTED_TEXT);
    let validated_idx = column(COLUMN_VALIDATED_TEXT);

    let mut result = Reconciliation::default();

    for row in reader.records() {
        let row = row?;
        let filename = row.get(filename_idx).unwrap_or_default().to_string();

        if !image_exists(image_dir, &filename) {
            result.missing_images.push(filename);
            continue;
        }

        let extracted = extracted_idx
            .and_then(|i| row.get(i))
            .unwrap_or_default();
        let validated = validated_idx
            .and_then(|i| row.get(i))
            .map(str::to_string);

        result
            .annotations
            .insert(filename.clone(), AnnotationRecord::new(extracted, validated));
        result.valid_images.push(filename);
    }

    if !result.missing_images.is_empty() {
        warn!(
            "画像が見つからない行: {}件（テキストは読み込まれません）",
            result.missing_images.len()
        );
    }

    Ok(result)
}

/// 画像フォルダ直下にファイルとして存在するか（フォルダ外を指す名前は存在しない扱い）
fn image_exists(image_dir: &Path, filename: &str) -> bool {
    is_plain_file_name(filename) && image_dir.join(filename).is_file()
}

/// CSVを全体上書きで保存
///
/// 列は `image_filename, extracted_text, validated_text`。
/// 行順はファイル名順（AnnotationSetの順序）。
pub fn save_annotations_csv(csv_path: &Path, annotations: &AnnotationSet) -> Result<()> {
    if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = BufWriter::new(File::create(csv_path)?);
    file.write_all(UTF8_BOM.as_bytes())?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(CSV_HEADER)?;

    for (filename, record) in annotations {
        writer.write_record([
            filename.as_str(),
            record.extracted_text.as_str(),
            record.validated_text.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// CSVがなければヘッダーのみのファイルを作成
///
/// # Returns
/// 新規作成した場合は true
pub fn ensure_annotation_csv(csv_path: &Path) -> Result<bool> {
    if csv_path.exists() {
        return Ok(false);
    }

    save_annotations_csv(csv_path, &AnnotationSet::new())?;
    Ok(true)
}
