use super::{ApiError, AppState};
use crate::ocr;
use crate::store;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use odia_ocr_common::types::value_to_text;
use odia_ocr_common::{is_plain_file_name, is_supported_image, AnnotationSet, Reconciliation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// ファイル名から最後の要素だけを取り出す（ディレクトリ指定を無視）
fn safe_file_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| is_plain_file_name(n))
}

/// GET /
pub async fn read_root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Odia OCR backend!" }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "odia-ocr".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub images: Vec<String>,
}

/// POST /upload/
///
/// 対応拡張子のファイルだけを画像フォルダに書き込む。それ以外は黙って無視。
pub async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().and_then(safe_file_name) else {
            continue;
        };

        if !is_supported_image(Path::new(&file_name)) {
            warn!("非対応形式のためスキップ: {}", file_name);
            continue;
        }

        let data = field.bytes().await?;
        tokio::fs::write(state.image_dir.join(&file_name), &data).await?;
        images.push(file_name);
    }

    info!("アップロード: {}枚", images.len());

    Ok(Json(UploadResponse {
        status: "success".to_string(),
        images,
    }))
}

#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    pub api_key: String,
    pub image_filenames: Vec<String>,
}

/// POST /process-ocr/
pub async fn process_ocr(
    State(state): State<AppState>,
    Json(request): Json<OcrRequest>,
) -> Json<BTreeMap<String, String>> {
    let results = ocr::recognize_batch(
        state.recognizer.as_ref(),
        &request.image_filenames,
        &state.image_dir,
        &request.api_key,
        &state.retry,
    )
    .await;

    Json(results)
}

/// GET /annotations/
pub async fn get_annotations(
    State(state): State<AppState>,
) -> Result<Json<Reconciliation>, ApiError> {
    let result = store::load_annotations(&state.annotation_csv, &state.image_dir)?;
    Ok(Json(result))
}

/// POST /save-annotations/
///
/// 受け取ったアノテーションでCSVとJSONミラーを全体上書き
pub async fn save_annotations(
    State(state): State<AppState>,
    Json(annotations): Json<AnnotationSet>,
) -> Result<Json<Value>, ApiError> {
    store::save_annotations(&state.annotation_csv, &annotations)?;
    Ok(Json(json!({ "status": "saved" })))
}

/// POST /import-csv/
///
/// multipart: `file`（CSV）と `image_folder`（照合先フォルダ、省略時は設定値）
/// アップロードされたCSVの形式不正は400
pub async fn import_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Reconciliation>, ApiError> {
    let mut csv_upload: Option<Vec<u8>> = None;
    let mut image_folder: Option<PathBuf> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let data = field.bytes().await?;
                csv_upload = Some(data.to_vec());
            }
            Some("image_folder") => {
                let folder = field.text().await?;
                if !folder.trim().is_empty() {
                    image_folder = Some(PathBuf::from(folder.trim()));
                }
            }
            _ => {}
        }
    }

    let data = csv_upload.ok_or_else(|| ApiError::bad_request("'file' フィールドがありません"))?;
    let image_folder = image_folder.unwrap_or_else(|| state.image_dir.clone());

    // リクエストごとに一意な一時ファイル（drop時に削除）
    tokio::fs::create_dir_all(&state.temp_dir).await?;
    let mut temp_file = tempfile::Builder::new()
        .prefix("import-")
        .suffix(".csv")
        .tempfile_in(&state.temp_dir)?;
    temp_file.write_all(&data)?;
    temp_file.flush()?;

    let result = store::load_annotations(temp_file.path(), &image_folder)
        .map_err(ApiError::from_client_input)?;

    if let Err(e) = temp_file.close() {
        warn!("一時ファイルの削除に失敗: {}", e);
    }

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub annotations: BTreeMap<String, Value>,
    #[serde(default)]
    pub validated_texts: BTreeMap<String, Value>,
}

fn texts(map: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), value_to_text(v)))
        .collect()
}

/// POST /export-csv/
///
/// 抽出テキストと校正テキストを結合してCSVに保存し、そのファイルを返す
pub async fn export_csv(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let combined = store::combine_export(&texts(&request.annotations), &texts(&request.validated_texts));
    store::save_annotations_csv(&state.annotation_csv, &combined)?;

    let body = tokio::fs::read(&state.annotation_csv).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"annotations.csv\""),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("page.png").as_deref(), Some("page.png"));
        assert_eq!(safe_file_name("../../etc/page.png").as_deref(), Some("page.png"));
        assert_eq!(safe_file_name("dir/ଓଡ଼ିଆ.jpg").as_deref(), Some("ଓଡ଼ିଆ.jpg"));
        assert_eq!(safe_file_name(""), None);
        assert_eq!(safe_file_name(".."), None);
    }

    #[test]
    fn test_texts_converts_numbers() {
        let mut map = BTreeMap::new();
        map.insert("a.png".to_string(), json!(12));
        map.insert("b.png".to_string(), json!("ଖ"));
        map.insert("c.png".to_string(), Value::Null);

        let converted = texts(&map);
        assert_eq!(converted["a.png"], "12");
        assert_eq!(converted["b.png"], "ଖ");
        assert_eq!(converted["c.png"], "");
    }
}
