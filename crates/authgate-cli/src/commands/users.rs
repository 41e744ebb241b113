//! 사용자 관리 명령어.
//!
//! 통합 테스트가 만든 계정을 정리하는 용도입니다. 삭제는 관리자 계정으로
//! 먼저 로그인할 수 있을 때만 수행합니다.

use anyhow::{bail, Context, Result};
use authgate_api::{IdentityProvider, ProviderUser};
use tracing::info;

/// 전체 사용자 목록.
pub async fn list_users(provider: &dyn IdentityProvider) -> Result<Vec<ProviderUser>> {
    provider
        .list_users()
        .await
        .context("Failed to list users")
}

/// 사용자 목록을 표 형식 문자열로 변환합니다.
pub fn format_users(users: &[ProviderUser]) -> String {
    if users.is_empty() {
        return "No users found".to_string();
    }

    let width = users.iter().map(|u| u.id.len()).max().unwrap_or(0).max(2);
    let mut out = format!("{:<width$}  {}\n", "ID", "EMAIL");
    for user in users {
        out.push_str(&format!("{:<width$}  {}\n", user.id, user.email));
    }
    out.push_str(&format!("{} user(s)", users.len()));
    out
}

/// 관리자 자격 증명을 확인한 뒤 사용자를 삭제합니다.
pub async fn delete_user(
    provider: &dyn IdentityProvider,
    admin: Option<(&str, &str)>,
    user_id: &str,
) -> Result<()> {
    let Some((email, password)) = admin else {
        bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set to delete users");
    };

    provider
        .sign_in(email, password)
        .await
        .context("Admin sign-in failed")?;

    provider
        .delete_user(user_id)
        .await
        .with_context(|| format!("Failed to delete user {user_id}"))?;

    info!(user_id, "User deleted");
    Ok(())
}
