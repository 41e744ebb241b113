//! API 라우트.
//!
//! 모든 엔드포인트는 `/api/v1` 아래에 있습니다.
//!
//! | 경로 | 인증 |
//! |---|---|
//! | `POST /api/v1/auth/signup` | - |
//! | `POST /api/v1/auth/login` | - |
//! | `POST /api/v1/auth/refresh` | - |
//! | `POST /api/v1/auth/logout` | 필요 |
//! | `GET /api/v1/profile` | 필요 |
//! | `GET /api/v1/health` | - |

pub mod auth;
pub mod health;
pub mod profile;

pub use auth::{
    auth_router, CredentialsRequest, LoginResponse, MessageResponse, RefreshRequest,
    RefreshResponse, SignUpResponse,
};
pub use health::{health_router, HealthResponse};
pub use profile::{profile_router, ProfileResponse};

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 세션 미들웨어가 상태를 필요로 하므로 상태까지 바인딩된 라우터를 반환합니다.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_router(state.clone()))
        .nest("/api/v1/profile", profile_router(state.clone()))
        .nest("/api/v1/health", health_router())
        .with_state(state)
}
