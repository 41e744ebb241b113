//! 테스트 유틸리티.
//!
//! 외부 프로바이더 없이 라우터 전체를 구동하기 위한 인메모리
//! [`MockIdentityProvider`]와 조작 가능한 시계 [`TestClock`]을 제공합니다.
//! `test-utils` feature로 다른 크레이트의 테스트에서도 사용할 수 있습니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use authgate_core::{Clock, TokenCodec};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::provider::{IdentityProvider, ProviderError, ProviderUser};
use crate::state::AppState;

/// 테스트용 서명 키 (32바이트 이상).
pub const TEST_SECRET: &[u8] = b"test-secret-key-for-authgate-32-bytes!!";

/// 호출 횟수를 기록하는 인메모리 프로바이더.
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    users: RwLock<HashMap<String, (ProviderUser, String)>>,
    logged_out: RwLock<Vec<String>>,
    unhealthy: AtomicBool,
    sign_in_status: AtomicU16,
    next_id: AtomicUsize,
    sign_up_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    health_calls: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사용자를 미리 등록합니다.
    pub async fn with_user(self, email: &str, password: &str) -> Self {
        // 호출 카운터에 포함하지 않는다
        self.insert(email, password).await;
        self
    }

    async fn insert(&self, email: &str, password: &str) -> ProviderUser {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = ProviderUser {
            id: format!("00000000-0000-0000-0000-{id:012}"),
            email: email.to_string(),
            role: Some("authenticated".to_string()),
        };
        self.users
            .write()
            .await
            .insert(email.to_string(), (user.clone(), password.to_string()));
        user
    }

    /// 상태 확인 실패를 흉내냅니다.
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    /// 이후 로그인 요청을 주어진 상태 코드로 거부합니다. 0이면 해제.
    pub fn reject_sign_in_with(&self, status: u16) {
        self.sign_in_status.store(status, Ordering::SeqCst);
    }

    pub fn sign_up_calls(&self) -> usize {
        self.sign_up_calls.load(Ordering::SeqCst)
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    /// 모든 상호작용 횟수 합계.
    pub fn total_calls(&self) -> usize {
        self.sign_up_calls() + self.sign_in_calls() + self.logout_calls() + self.health_calls()
    }

    /// `logout`에 전달된 토큰 목록 (호출 순서).
    pub async fn logged_out_tokens(&self) -> Vec<String> {
        self.logged_out.read().await.clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);

        if self.users.read().await.contains_key(email) {
            return Err(ProviderError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        Ok(self.insert(email, password).await)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        let status = self.sign_in_status.load(Ordering::SeqCst);
        if status != 0 {
            return Err(ProviderError::Rejected {
                status,
                message: "rejected by provider".to_string(),
            });
        }

        match self.users.read().await.get(email) {
            Some((user, stored)) if stored == password => Ok(user.clone()),
            _ => Err(ProviderError::InvalidCredentials),
        }
    }

    async fn logout(&self, access_token: &str) -> Result<(), ProviderError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.logged_out.write().await.push(access_token.to_string());
        Ok(())
    }

    async fn health(&self) -> Result<Value, ProviderError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);

        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("connection refused".to_string()));
        }
        Ok(json!({ "name": "MockIdentityProvider", "version": "test" }))
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, ProviderError> {
        let mut users: Vec<_> = self
            .users
            .read()
            .await
            .values()
            .map(|(user, _)| user.clone())
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|_, (user, _)| user.id != user_id);

        if users.len() == before {
            return Err(ProviderError::Rejected {
                status: 404,
                message: "User not found".to_string(),
            });
        }
        Ok(())
    }
}

/// 앞으로만 이동하는 테스트 시계.
#[derive(Debug, Clone)]
pub struct TestClock {
    base: DateTime<Utc>,
    offset_secs: Arc<AtomicI64>,
}

impl Default for TestClock {
    fn default() -> Self {
        Self {
            base: Utc::now(),
            offset_secs: Arc::new(AtomicI64::new(0)),
        }
    }
}

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 시각.
    pub fn now(&self) -> DateTime<Utc> {
        self.base + Duration::seconds(self.offset_secs.load(Ordering::SeqCst))
    }

    /// 시계를 앞으로 이동합니다.
    pub fn advance(&self, by: Duration) {
        self.offset_secs.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }

    /// [`TokenCodec::with_clock`]에 넘길 시계.
    pub fn as_clock(&self) -> Clock {
        let clock = self.clone();
        Arc::new(move || clock.now())
    }
}

/// 15분/7일 수명의 테스트 코덱.
pub fn test_codec(clock: &TestClock) -> TokenCodec {
    TokenCodec::new(TEST_SECRET, Duration::minutes(15), Duration::days(7))
        .with_clock(clock.as_clock())
}

/// 주어진 프로바이더와 시계로 AppState를 생성합니다.
pub fn test_state_with(provider: Arc<MockIdentityProvider>, clock: &TestClock) -> AppState {
    AppState::new(test_codec(clock), provider)
}

/// 빈 프로바이더와 실제 시간 기준으로 AppState를 생성합니다.
pub fn create_test_state() -> AppState {
    test_state_with(Arc::new(MockIdentityProvider::new()), &TestClock::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_flow() {
        let provider = MockIdentityProvider::new();

        let user = provider.sign_up("a@example.com", "password123").await.unwrap();
        assert!(provider.sign_up("a@example.com", "password123").await.is_err());

        let signed_in = provider.sign_in("a@example.com", "password123").await.unwrap();
        assert_eq!(signed_in, user);
        assert!(matches!(
            provider.sign_in("a@example.com", "nope-nope").await,
            Err(ProviderError::InvalidCredentials)
        ));

        assert_eq!(provider.sign_up_calls(), 2);
        assert_eq!(provider.sign_in_calls(), 2);

        provider.delete_user(&user.id).await.unwrap();
        assert!(provider.list_users().await.unwrap().is_empty());
    }

    #[test]
    fn test_clock_advances() {
        let clock = TestClock::new();
        let start = clock.now();
        clock.advance(Duration::minutes(16));
        assert_eq!(clock.now() - start, Duration::minutes(16));

        let shared = clock.as_clock();
        assert_eq!(shared(), clock.now());
    }
}
