//! 세션 미들웨어와 인증 추출기.
//!
//! 보호된 라우트 앞에서 `Authorization` 헤더의 Access Token을 검증하고,
//! 성공하면 요청 extension에 [`Session`]을 넣습니다. 핸들러는
//! [`Authenticated`] 추출기로 세션을 꺼냅니다.

use std::sync::Arc;

use authgate_core::{BearerMode, TokenKind};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::metrics::record_token_rejection;
use crate::state::AppState;

const BEARER_PREFIX: &str = "bearer ";

/// 인증된 요청자 정보.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// 사용자 ID (`sub`)
    pub subject: String,
    pub email: String,
    pub role: Option<String>,
    bearer: String,
}

impl Session {
    /// 요청자가 제시한 원시 토큰.
    ///
    /// 요청자를 대신해 프로바이더를 호출할 때만 사용합니다. 로그에 남기지 않습니다.
    pub fn bearer(&self) -> &str {
        &self.bearer
    }
}

/// `Bearer ` 접두사(대소문자 무시)를 떼어낸 나머지.
fn strip_bearer(header: &str) -> Option<&str> {
    let prefix = header.get(..BEARER_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(BEARER_PREFIX)
        .then(|| &header[BEARER_PREFIX.len()..])
}

/// 헤더 값에서 토큰을 추출합니다.
///
/// 모드에 맞지 않는 형식이거나 토큰이 비어 있으면 `None`.
pub fn extract_token(header: &str, mode: BearerMode) -> Option<&str> {
    let header = header.trim_start();
    let token = match (mode, strip_bearer(header)) {
        (BearerMode::Optional | BearerMode::Required, Some(token)) => token.trim(),
        (BearerMode::Optional | BearerMode::Raw, None) => header.trim_end(),
        (BearerMode::Required, None) | (BearerMode::Raw, Some(_)) => return None,
    };
    (!token.is_empty()).then_some(token)
}

/// 보호된 라우트용 세션 미들웨어.
///
/// 토큰이 없거나 유효하지 않으면 핸들러를 호출하지 않고 401을 반환합니다.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            record_token_rejection("missing");
            ApiError::Unauthenticated("Authorization token missing")
        })?;

    let token = extract_token(header, state.bearer_mode).ok_or_else(|| {
        warn!(mode = ?state.bearer_mode, path = %request.uri().path(), "Malformed Authorization header");
        record_token_rejection("malformed_header");
        ApiError::Unauthenticated("Invalid token")
    })?;

    let claims = state
        .codec
        .verify(token, TokenKind::Access)
        .map_err(|err| {
            warn!(reason = err.reason(), path = %request.uri().path(), "Access token rejected");
            record_token_rejection(err.reason());
            ApiError::Unauthenticated("Invalid token")
        })?;

    debug!(subject = %claims.sub, "Session established");

    let session = Session {
        bearer: token.to_string(),
        subject: claims.sub,
        email: claims.email,
        role: claims.role,
    };
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// 세션 추출기.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(Authenticated(session): Authenticated) -> String {
///     format!("Authenticated user: {}", session.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Authenticated)
            .ok_or(ApiError::Unauthenticated("User not authenticated"))
    }
}
