//! 프로필 endpoint.
//!
//! 토큰에 담긴 신원 정보만 반환하며 프로바이더를 호출하지 않습니다.

use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{session_middleware, Authenticated};
use crate::state::AppState;

/// 프로필 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub email: String,
    pub role: Option<String>,
    pub user_id: String,
}

/// 현재 사용자 프로필 조회.
///
/// GET /api/v1/profile
pub async fn get_profile(Authenticated(session): Authenticated) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        email: session.email,
        role: session.role,
        user_id: session.subject,
    })
}

/// 프로필 라우터 생성.
pub fn profile_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_profile))
        .route_layer(middleware::from_fn_with_state(state, session_middleware))
}
