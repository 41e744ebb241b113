//! 인증 게이트웨이 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (가입, 로그인, 토큰 재발급, 로그아웃, 프로필, 헬스 체크)
//! - Access Token 세션 미들웨어
//! - 외부 아이덴티티 프로바이더(GoTrue) 클라이언트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 세션 미들웨어 및 인증 추출기
//! - [`provider`]: 아이덴티티 프로바이더 추상화와 GoTrue 구현
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod provider;
pub mod routes;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use auth::{extract_token, session_middleware, Authenticated, Session};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use provider::{GoTrueClient, IdentityProvider, ProviderError, ProviderUser};
pub use routes::create_api_router;
pub use state::AppState;
