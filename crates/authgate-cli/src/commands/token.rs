//! 토큰 로컬 검증.
//!
//! 서버와 달리 거부 사유를 그대로 보여줍니다.

use authgate_core::{Claims, TokenCodec, TokenError, TokenKind};
use chrono::{DateTime, Utc};

/// 검증 결과.
#[derive(Debug)]
pub enum Inspection {
    Valid(Claims),
    Rejected(TokenError),
}

impl Inspection {
    /// 사람이 읽을 수 있는 보고서.
    pub fn report(&self) -> String {
        match self {
            Inspection::Valid(claims) => {
                let expires = DateTime::<Utc>::from_timestamp(claims.exp, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| claims.exp.to_string());
                format!(
                    "valid {} token\n  sub:   {}\n  email: {}\n  role:  {}\n  jti:   {}\n  exp:   {}",
                    claims.token_type,
                    claims.sub,
                    claims.email,
                    claims.role.as_deref().unwrap_or("-"),
                    claims.jti,
                    expires,
                )
            }
            Inspection::Rejected(err) => format!("rejected ({}): {}", err.reason(), err),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Inspection::Valid(_))
    }
}

/// 토큰을 검증합니다.
///
/// `kind`가 없으면 토큰에 적힌 종류로 검증합니다.
pub fn inspect_token(codec: &TokenCodec, token: &str, kind: Option<TokenKind>) -> Inspection {
    let result = match kind {
        Some(kind) => codec.verify(token, kind),
        None => match codec.verify(token, TokenKind::Access) {
            Err(TokenError::WrongKind { actual, .. }) => codec.verify(token, actual),
            other => other,
        },
    };

    match result {
        Ok(claims) => Inspection::Valid(claims),
        Err(err) => Inspection::Rejected(err),
    }
}
