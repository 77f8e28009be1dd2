use crate::error::{OdiaOcrError, Result};
use odia_ocr_common::is_supported_image;
use std::path::Path;
use walkdir::WalkDir;

/// 画像フォルダ直下の対応画像のファイル名を列挙（ファイル名順）
pub fn scan_image_folder(folder: &Path) -> Result<Vec<String>> {
    if !folder.is_dir() {
        return Err(OdiaOcrError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<String> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_supported_image(e.path()))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();

    images.sort();

    Ok(images)
}
