//! 프로바이더 상태 점검.

use anyhow::{Context, Result};
use authgate_api::IdentityProvider;
use serde_json::Value;

/// 프로바이더 상태 JSON을 조회합니다.
pub async fn check_health(provider: &dyn IdentityProvider) -> Result<Value> {
    provider
        .health()
        .await
        .context("Provider health check failed")
}
