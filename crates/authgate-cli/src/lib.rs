//! 인증 게이트웨이 운영 도구.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 프로바이더 상태 점검
//! - 사용자 목록 조회 및 삭제 (테스트 계정 정리)
//! - 토큰 로컬 검증

pub mod commands;

pub use commands::*;
