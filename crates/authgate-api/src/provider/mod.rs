//! 아이덴티티 프로바이더 추상화.
//!
//! 게이트웨이는 사용자 등록/비밀번호 확인/세션 종료/상태 확인을 외부
//! 프로바이더에 위임합니다. 핸들러는 [`IdentityProvider`] 트레이트만
//! 의존하므로 테스트에서는 인메모리 구현으로 교체할 수 있습니다.

pub mod gotrue;

pub use gotrue::GoTrueClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 프로바이더가 관리하는 사용자 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// 프로바이더가 부여한 사용자 ID
    pub id: String,
    /// 이메일 (전화번호 가입 사용자는 비어 있을 수 있음)
    #[serde(default)]
    pub email: String,
    /// 프로바이더 측 역할
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// 프로바이더 호출 에러.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 이메일/비밀번호 불일치
    #[error("invalid credentials")]
    InvalidCredentials,

    /// 프로바이더가 요청을 거부함
    #[error("provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 네트워크 오류 (연결 실패, 타임아웃 등)
    #[error("network error: {0}")]
    Network(String),

    /// 응답 파싱 실패
    #[error("parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// 메트릭 라벨용 짧은 분류.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::Rejected { .. } => "rejected",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
        }
    }

    /// 자격 증명 자체가 거부되었는지 여부.
    ///
    /// 422 외의 4xx(429 rate limit, 404 등)는 프로바이더 측 문제로 봅니다.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidCredentials => true,
            Self::Rejected { status, .. } => *status == 422,
            Self::Network(_) | Self::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// 외부 아이덴티티 프로바이더 인터페이스.
///
/// 프로바이더가 발급한 세션 토큰은 반환하지 않습니다. 클라이언트에 전달되는
/// 토큰은 항상 게이트웨이가 직접 발급합니다.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 신규 사용자를 등록합니다.
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError>;

    /// 이메일/비밀번호를 확인하고 사용자 레코드를 반환합니다.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError>;

    /// 주어진 bearer 토큰(요청자가 제시한 토큰)의 세션을 종료합니다.
    async fn logout(&self, access_token: &str) -> Result<(), ProviderError>;

    /// 프로바이더 상태 정보를 조회합니다.
    async fn health(&self) -> Result<serde_json::Value, ProviderError>;

    /// 전체 사용자 목록 (관리자 권한)
    async fn list_users(&self) -> Result<Vec<ProviderUser>, ProviderError>;

    /// 사용자 삭제 (관리자 권한)
    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(ProviderError::InvalidCredentials.is_client_error());
        assert!(ProviderError::Rejected {
            status: 422,
            message: "User already registered".to_string(),
        }
        .is_client_error());
        assert!(!ProviderError::Rejected {
            status: 503,
            message: "unavailable".to_string(),
        }
        .is_client_error());
        for status in [404, 429] {
            assert!(!ProviderError::Rejected {
                status,
                message: "upstream".to_string(),
            }
            .is_client_error());
        }
        assert!(!ProviderError::Network("refused".to_string()).is_client_error());
    }

    #[test]
    fn test_provider_user_tolerates_missing_fields() {
        let user: ProviderUser =
            serde_json::from_value(serde_json::json!({ "id": "u-1", "aud": "authenticated" }))
                .unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.email, "");
        assert_eq!(user.role, None);
    }
}
