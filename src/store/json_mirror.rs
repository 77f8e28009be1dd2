//! アノテーションのJSONミラー
//!
//! ファイル名をキーにしたオブジェクト。インデント2、非ASCIIはエスケープせずそのまま出力。

use crate::error::Result;
use odia_ocr_common::AnnotationSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// CSVと同じベースパスの `.json`
pub fn json_mirror_path(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("json")
}

pub fn save_annotations_json(json_path: &Path, annotations: &AnnotationSet) -> Result<()> {
    if let Some(parent) = json_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(json_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, annotations)?;
    writer.flush()?;
    Ok(())
}

/// JSONミラーを読み込み（存在しなければ空）
pub fn load_annotations_json(json_path: &Path) -> Result<AnnotationSet> {
    if !json_path.exists() {
        return Ok(AnnotationSet::new());
    }

    let file = File::open(json_path)?;
    let reader = BufReader::new(file);
    let annotations: AnnotationSet = serde_json::from_reader(reader)?;
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use odia_ocr_common::AnnotationRecord;
    use tempfile::tempdir;

    #[test]
    fn test_json_mirror_path() {
        assert_eq!(
            json_mirror_path(Path::new("annotations/annotations.csv")),
            PathBuf::from("annotations/annotations.json")
        );
    }

    #[test]
    fn test_json_is_pretty_and_unescaped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");

        let mut annotations = AnnotationSet::new();
        annotations.insert("b.png".into(), AnnotationRecord::new("ଓଡ଼ିଆ", None));
        annotations.insert("a.png".into(), AnnotationRecord::new("କ", Some("ଖ".into())));
        save_annotations_json(&path, &annotations).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("ଓଡ଼ିଆ"));
        assert!(!text.contains("\\u"));
        assert!(text.contains("\n  \"a.png\": {\n    \"extracted_text\""));
        // キーはファイル名順
        assert!(text.find("a.png").unwrap() < text.find("b.png").unwrap());
    }

    #[test]
    fn test_load_missing_json_is_empty() {
        let dir = tempdir().unwrap();
        let loaded = load_annotations_json(&dir.path().join("none.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_corrupted_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ invalid json }").unwrap();
        assert!(load_annotations_json(&path).is_err());
    }
}
