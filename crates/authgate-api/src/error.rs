//! API 에러 응답 타입.
//!
//! 모든 엔드포인트는 실패 시 `{"error": "<메시지>"}` 형식의 본문을 반환합니다.
//! 내부 원인(프로바이더 응답, 토큰 검증 사유)은 서버 로그에만 남기고
//! 클라이언트에는 고정된 메시지만 노출합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// 에러 응답 본문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// 핸들러와 미들웨어가 반환하는 API 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 요청 본문이 누락/형식 오류이거나 검증 규칙을 위반함 (400)
    #[error("Invalid request payload")]
    Validation,

    /// 자격 증명 또는 토큰이 유효하지 않음 (401)
    #[error("{0}")]
    Unauthenticated(&'static str),

    /// 아이덴티티 프로바이더 호출 실패 (500)
    #[error("{0}")]
    Upstream(&'static str),

    /// 게이트웨이 내부 실패 (500)
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// API 핸들러 결과 타입.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthenticated("Invalid token").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Upstream("Failed to log out").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal("Failed to generate tokens").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::Unauthenticated("Invalid credentials").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Invalid credentials" }));
    }
}
