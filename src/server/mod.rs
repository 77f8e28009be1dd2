//! HTTPサーバー
//!
//! ストアとOCRディスパッチャへの薄いアダプタ。リクエストを各操作の引数に
//! 変換し、結果またはエラーをそのまま返す。

mod error;
mod handlers;

pub use error::ApiError;

use crate::config::Config;
use crate::error::{OdiaOcrError, Result};
use crate::ocr::{RetryPolicy, TextRecognizer};
use crate::store;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// アップロード1リクエストの上限
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// ハンドラ間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub image_dir: PathBuf,
    pub annotation_csv: PathBuf,
    pub temp_dir: PathBuf,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(config: &Config, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            image_dir: config.image_dir.clone(),
            annotation_csv: config.annotation_csv.clone(),
            temp_dir: config.temp_dir.clone(),
            recognizer,
            retry: config.retry_policy(),
        }
    }

    /// 画像・一時フォルダとヘッダーのみのCSVを用意
    pub fn prepare_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.image_dir)?;
        std::fs::create_dir_all(&self.temp_dir)?;
        if store::ensure_annotation_csv(&self.annotation_csv)? {
            info!("アノテーションCSVを作成: {}", self.annotation_csv.display());
        }
        Ok(())
    }
}

/// CORS設定（"*" を含む場合は全オリジン許可）
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let images = ServeDir::new(&state.image_dir);

    Router::new()
        .route("/", get(handlers::read_root))
        .route("/health", get(handlers::health_check))
        .route("/upload/", post(handlers::upload_images))
        .route("/process-ocr/", post(handlers::process_ocr))
        .route("/annotations/", get(handlers::get_annotations))
        .route("/save-annotations/", post(handlers::save_annotations))
        .route("/import-csv/", post(handlers::import_csv))
        .route("/export-csv/", post(handlers::export_csv))
        .nest_service("/images", images)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
}

/// 設定に従ってサーバーを起動
pub async fn serve(config: &Config, recognizer: Arc<dyn TextRecognizer>) -> Result<()> {
    let state = AppState::new(config, recognizer);
    state.prepare_directories()?;

    let app = build_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .map_err(|e| OdiaOcrError::Config(format!("{} にバインドできません: {}", config.bind_address, e)))?;

    info!("odia-ocr listening on http://{}", config.bind_address);
    info!("画像フォルダ: {}", config.image_dir.display());
    info!("アノテーション: {}", config.annotation_csv.display());

    axum::serve(listener, app).await?;

    Ok(())
}
