//! 인증 모듈.
//!
//! 토큰 발급/검증은 `authgate_core::TokenCodec`이 담당하고, 이 모듈은
//! HTTP 경계(헤더 해석, 세션 전달)만 다룹니다.

pub mod middleware;

pub use middleware::{extract_token, session_middleware, Authenticated, Session};
