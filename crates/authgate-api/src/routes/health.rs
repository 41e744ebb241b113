//! 헬스 체크 endpoint.
//!
//! 프로바이더 상태를 함께 조회하여 반환합니다. 로드밸런서에서 사용됩니다.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_provider_call;
use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 서비스 상태 (항상 "healthy", 실패 시에는 에러 응답)
    pub status: String,

    /// 프로바이더가 반환한 상태 정보
    pub provider_status: Value,

    /// 게이트웨이 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,
}

/// 헬스 체크.
///
/// GET /api/v1/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let provider_status = state.provider.health().await.map_err(|err| {
        record_provider_call("health", err.kind());
        error!(error = %err, "Provider health check failed");
        ApiError::Upstream("Provider health check failed")
    })?;
    record_provider_call("health", "ok");

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        provider_status,
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
    }))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(health_check))
}
