use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::aggregator::ValidationError;

/// `/api/fetch` のクエリパラメータ
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchParams {
    /// 動画ID
    pub id: Option<String>,
    /// チャンネルID
    pub channel: Option<String>,
    /// 検索クエリ
    pub search: Option<String>,
    /// カンマ区切りのフィールド一覧
    pub fields: Option<String>,
}

/// `/api/analyze_video` のクエリパラメータ
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeParams {
    pub id: Option<String>,
}

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub server: &'static str,
    pub version: &'static str,
}

/// JSONエラーレスポンス `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
