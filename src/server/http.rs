use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::types::{AnalyzeParams, ApiError, FetchParams, HealthResponse};
use crate::aggregator::{self, FetchRequest};
use crate::invidious::InvidiousClient;
use crate::report;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";
const MISSING_VIDEO_ID: &str = "Error: A video 'id' parameter is required.";

/// HTTPサーバー用の共有状態
#[derive(Clone)]
pub struct HttpState {
    pub client: Arc<InvidiousClient>,
}

/// ルーティングテーブル
///
/// 全エンドポイントをここで登録し、集約・レポートの単一実装に振り分ける
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/fetch", get(fetch_api))
        .route("/api/analyze_video", get(analyze_video_api))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTPサーバーを起動（Ctrl+Cで終了）
pub async fn start_http_server(
    addr: std::net::SocketAddr,
    state: HttpState,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install Ctrl+C handler: {}", e);
    }
}

/// ヘルスチェックエンドポイント
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// 集約取得API
async fn fetch_api(
    State(state): State<HttpState>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            log::warn!("Rejected fetch query: {}", rejection.body_text());
            return ApiError::bad_request(rejection.body_text()).into_response();
        }
    };

    let request = FetchRequest::from_params(
        params.id,
        params.channel,
        params.search,
        params.fields.as_deref(),
    );

    log::info!(
        "Fetch request: id={:?} channel={:?} search={:?} fields={:?}",
        request.video_id,
        request.channel_id,
        request.query,
        request.fields
    );

    match aggregator::aggregate(&state.client, &request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            log::warn!("Rejected fetch request: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

/// 動画分析レポートAPI（text/plain）
async fn analyze_video_api(
    State(state): State<HttpState>,
    params: Result<Query<AnalyzeParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            log::warn!("Rejected analyze query: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)],
                format!("Error: {}", rejection.body_text()),
            )
                .into_response();
        }
    };

    let Some(video_id) = params.id.filter(|id| !id.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)],
            MISSING_VIDEO_ID,
        )
            .into_response();
    };

    let report = report::generate_report(&state.client, &video_id).await;

    ([(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)], report).into_response()
}

async fn not_found() -> ApiError {
    ApiError::not_found("endpoint not found")
}
