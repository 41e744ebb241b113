//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다. 요청별 가변 상태는
//! 두지 않습니다. 인증된 요청자의 정보는 요청 extension([`Session`])으로만
//! 전달됩니다.
//!
//! [`Session`]: crate::auth::Session

use std::sync::Arc;

use authgate_core::{BearerMode, TokenCodec};
use chrono::{DateTime, Utc};

use crate::provider::IdentityProvider;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 토큰 발급/검증기
    pub codec: Arc<TokenCodec>,

    /// 외부 아이덴티티 프로바이더
    pub provider: Arc<dyn IdentityProvider>,

    /// `Authorization` 헤더 해석 방식
    pub bearer_mode: BearerMode,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,

    /// 애플리케이션 버전
    pub version: String,
}

impl AppState {
    /// 새 AppState 생성.
    pub fn new(codec: TokenCodec, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            codec: Arc::new(codec),
            provider,
            bearer_mode: BearerMode::default(),
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Bearer 접두사 처리 방식을 설정합니다.
    #[must_use]
    pub fn with_bearer_mode(mut self, mode: BearerMode) -> Self {
        self.bearer_mode = mode;
        self
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("codec", &self.codec)
            .field("bearer_mode", &self.bearer_mode)
            .field("started_at", &self.started_at)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
