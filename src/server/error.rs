use crate::error::OdiaOcrError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// ハンドラのエラー（`{"detail": ...}` で返す）
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl ApiError {
    /// クライアントが送ったデータの不備は400、それ以外は500
    pub fn from_client_input(err: OdiaOcrError) -> Self {
        match err {
            OdiaOcrError::MalformedCsv(_) | OdiaOcrError::Csv(_) => Self::bad_request(err.to_string()),
            other => other.into(),
        }
    }
}

impl From<OdiaOcrError> for ApiError {
    fn from(err: OdiaOcrError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        OdiaOcrError::Io(err).into()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::bad_request(format!("multipartの読み込みに失敗: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}", self.detail);
        }

        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
