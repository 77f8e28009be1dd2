//! 画像形式とOCR結果のセンチネル値
//!
//! バッチOCRは画像ごとの失敗を例外にせず、固定の文字列で結果に埋め込む。

use std::path::{Component, Path};

/// 対応する画像拡張子（小文字）
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "tiff"];

/// 画像ファイルが存在しない
pub const IMAGE_NOT_FOUND: &str = "[Image file not found]";

/// 非対応形式または読み込み失敗
pub const IMAGE_NOT_PROCESSED: &str = "[Image could not be processed]";

/// OCR成功だがテキストが空
pub const NO_TEXT_EXTRACTED: &str = "[No text extracted]";

/// リトライを使い切った場合のセンチネル
pub fn ocr_failed(attempts: u32, error: &str) -> String {
    format!("[OCR failed after {} attempts: {}]", attempts, error)
}

/// 失敗を表すセンチネルかどうか
///
/// `[No text extracted]` はOCR自体は成功しているので含めない。
pub fn is_failure_sentinel(text: &str) -> bool {
    text == IMAGE_NOT_FOUND || text == IMAGE_NOT_PROCESSED || text.starts_with("[OCR failed after ")
}

/// 画像フォルダ直下の1ファイルを指す名前かどうか
///
/// `..`・絶対パス・サブディレクトリ付きの名前は拒否する。
pub fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// 拡張子を小文字で取得
fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// 対応拡張子かどうか（大文字小文字を区別しない）
pub fn is_supported_image(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| SUPPORTED_IMAGE_TYPES.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// 拡張子からMIMEタイプを決定
///
/// # Returns
/// * `Some("image/jpeg")` など - 対応形式
/// * `None` - 非対応形式
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    match lowercase_extension(path)?.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "bmp" => Some("image/bmp"),
        "webp" => Some("image/webp"),
        "tiff" => Some("image/tiff"),
        _ => None,
    }
}
