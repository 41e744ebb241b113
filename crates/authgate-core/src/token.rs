//! 토큰 발급 및 검증.
//!
//! HS256 대칭 키로 서명된 compact JWS 문자열을 만들고, 다시 Claims로 복원합니다.
//! 서버는 발급한 토큰을 저장하지 않으며, 토큰은 만료로만 무효화됩니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::claims::{Claims, Identity, TokenKind, ISSUER};
use crate::config::{ConfigError, TokenConfig};

/// 현재 시각 공급자.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access Token
    pub access_token: String,
    /// Refresh Token
    pub refresh_token: String,
    /// Access Token 만료 시간 (초)
    pub expires_in: i64,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
}

/// 토큰 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("잘못된 토큰 형식")]
    InvalidFormat,
    #[error("서명이 일치하지 않습니다")]
    SignatureMismatch,
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("발급자가 일치하지 않습니다")]
    InvalidIssuer,
    #[error("토큰 종류가 다릅니다: {expected} 필요, {actual} 수신")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
}

impl TokenError {
    /// 메트릭 라벨용 사유 문자열.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Encoding(_) => "encoding",
            TokenError::InvalidFormat => "invalid_format",
            TokenError::SignatureMismatch => "signature_mismatch",
            TokenError::Expired => "expired",
            TokenError::InvalidIssuer => "invalid_issuer",
            TokenError::WrongKind { .. } => "wrong_kind",
        }
    }
}

/// 토큰 코덱.
///
/// 서명 키와 유효 기간은 생성 후 바뀌지 않으며, 모든 메서드는 `&self`만 받으므로
/// 여러 요청에서 동시에 호출해도 안전합니다.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    clock: Clock,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// 새로운 TokenCodec 생성.
    ///
    /// # Arguments
    ///
    /// * `secret` - HS256 서명 키
    /// * `access_lifetime` - Access Token 유효 기간
    /// * `refresh_lifetime` - Refresh Token 유효 기간
    pub fn new(secret: &[u8], access_lifetime: Duration, refresh_lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 verify_at에서 직접 비교 (leeway 없음, exp == now도 만료)
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.set_issuer(&[ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_lifetime,
            refresh_lifetime,
            clock: Arc::new(Utc::now),
        }
    }

    /// 설정에서 TokenCodec 생성.
    ///
    /// # Errors
    ///
    /// 유효 기간이 `Duration`으로 표현할 수 없는 값이면 `ConfigError::Invalid`를 반환합니다.
    pub fn from_config(config: &TokenConfig) -> Result<Self, ConfigError> {
        let lifetime = |secs: i64| {
            Duration::try_seconds(secs)
                .ok_or_else(|| ConfigError::Invalid(format!("token lifetime out of range: {secs}")))
        };

        Ok(Self::new(
            config.secret.expose_secret().as_bytes(),
            lifetime(config.access_lifetime_secs)?,
            lifetime(config.refresh_lifetime_secs)?,
        ))
    }

    /// 시각 공급자 교체 (테스트용).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// 현재 시각.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// 토큰 종류별 유효 기간.
    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_lifetime,
            TokenKind::Refresh => self.refresh_lifetime,
        }
    }

    /// 현재 시각 기준으로 토큰 발급.
    ///
    /// # Errors
    ///
    /// 서명에 실패하면 `TokenError::Encoding`을 반환합니다.
    pub fn issue(&self, identity: &Identity, kind: TokenKind) -> Result<String, TokenError> {
        self.issue_at(identity, kind, self.now())
    }

    /// 주어진 시각 기준으로 토큰 발급.
    ///
    /// `iat = now`, `exp = now + lifetime(kind)`를 찍고 서명합니다.
    ///
    /// # Errors
    ///
    /// 서명에 실패하면 `TokenError::Encoding`을 반환합니다.
    pub fn issue_at(
        &self,
        identity: &Identity,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(
            identity,
            kind,
            now.timestamp(),
            self.lifetime(kind).num_seconds(),
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::from)
    }

    /// Access Token + Refresh Token 쌍 발급.
    ///
    /// # Errors
    ///
    /// 둘 중 하나라도 서명에 실패하면 `TokenError::Encoding`을 반환합니다.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let now = self.now();
        let access_token = self.issue_at(identity, TokenKind::Access, now)?;
        let refresh_token = self.issue_at(identity, TokenKind::Refresh, now)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_lifetime.num_seconds(),
            token_type: "Bearer".to_string(),
        })
    }

    /// 현재 시각 기준으로 토큰 검증.
    ///
    /// # Errors
    ///
    /// [`verify_at`](Self::verify_at) 참고.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        self.verify_at(token, expected, self.now())
    }

    /// 주어진 시각 기준으로 토큰 디코딩 및 검증.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidFormat`: 구조, base64, JSON, 필수 클레임, 알고리즘 오류
    /// - `TokenError::SignatureMismatch`: 변조되었거나 다른 키로 서명됨
    /// - `TokenError::InvalidIssuer`: 다른 발급자
    /// - `TokenError::Expired`: `now >= exp`
    /// - `TokenError::WrongKind`: 기대한 토큰 종류가 아님
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::InvalidFormat,
            },
        )?;

        let claims = token_data.claims;

        if claims.is_expired_at(now.timestamp()) {
            return Err(TokenError::Expired);
        }

        if claims.token_type != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.token_type,
            });
        }

        Ok(claims)
    }
}
