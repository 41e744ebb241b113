//! 토큰 페이로드(Claims) 정의.
//!
//! Access Token과 Refresh Token은 같은 Claims 구조를 공유하며
//! `token_type` 클레임으로만 구분됩니다.

use serde::{Deserialize, Serialize};

/// 이 서비스가 발급한 토큰의 `iss` 값.
pub const ISSUER: &str = "auth-service";

/// 토큰 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// 보호된 요청마다 전달되는 단기 토큰
    Access,
    /// 토큰 갱신 엔드포인트에만 전달되는 장기 토큰
    Refresh,
}

impl TokenKind {
    /// 문자열에서 토큰 종류 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "access" => Some(TokenKind::Access),
            "refresh" => Some(TokenKind::Refresh),
            _ => None,
        }
    }

    /// 메트릭 라벨 등에 쓰이는 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 토큰에 담기는 사용자 식별 정보.
///
/// 호출자가 제공하는 부분이며, 타임스탬프와 발급자는
/// [`TokenCodec`](crate::token::TokenCodec)이 채웁니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// 외부 Identity Provider가 부여한 사용자 ID
    pub subject: String,
    /// 사용자 이메일 (권한 판단에는 사용하지 않음)
    pub email: String,
    /// 권한 역할 (예: "authenticated", "admin")
    pub role: Option<String>,
}

impl Identity {
    /// 새로운 Identity 생성.
    pub fn new(subject: impl Into<String>, email: impl Into<String>, role: Option<String>) -> Self {
        Self {
            subject: subject.into(),
            email: email.into(),
            role,
        }
    }
}

/// 서명된 토큰의 페이로드.
///
/// 발급 이후에는 변경되지 않습니다. 갱신은 항상 새 토큰 발급으로 이루어집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 사용자 이메일
    pub email: String,
    /// 사용자 역할
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issuer - 항상 [`ISSUER`]
    pub iss: String,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    pub jti: String,
    /// 토큰 종류
    pub token_type: TokenKind,
}

impl Claims {
    /// Identity와 발급 시각, 유효 기간(초)으로 Claims 생성.
    pub fn new(identity: &Identity, kind: TokenKind, issued_at: i64, lifetime_secs: i64) -> Self {
        Self {
            sub: identity.subject.clone(),
            email: identity.email.clone(),
            role: identity.role.clone(),
            iss: ISSUER.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime_secs),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: kind,
        }
    }

    /// 토큰에 담긴 Identity 반환.
    pub fn identity(&self) -> Identity {
        Identity {
            subject: self.sub.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }

    /// 주어진 시각(Unix timestamp)에 만료되었는지 확인.
    ///
    /// `exp`와 같은 시각부터 만료로 취급합니다.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }
}
