//! # Authgate Core
//!
//! 인증 게이트웨이의 핵심 타입을 제공합니다:
//! - 토큰 페이로드 ([`Claims`], [`Identity`], [`TokenKind`])
//! - 토큰 발급/검증 ([`TokenCodec`])
//! - 설정 관리 ([`GatewayConfig`])
//! - 로깅 인프라

pub mod claims;
pub mod config;
pub mod logging;
pub mod token;

pub use claims::{Claims, Identity, TokenKind, ISSUER};
pub use config::{
    AdminConfig, BearerMode, ConfigError, GatewayConfig, LoggingConfig, ProviderConfig,
    ServerConfig, TokenConfig,
};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use token::{Clock, TokenCodec, TokenError, TokenPair};
