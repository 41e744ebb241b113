//! GoTrue(Supabase Auth) REST 클라이언트.
//!
//! 모든 요청에 `apikey` 헤더로 서비스 키를 보냅니다. 관리자 API와 가입 요청은
//! 서비스 키를 bearer 토큰으로도 함께 보냅니다.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, AUTHORIZATION},
    RequestBuilder, Response, StatusCode, Url,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use authgate_core::ProviderConfig;

use super::{IdentityProvider, ProviderError, ProviderUser};

/// GoTrue REST 클라이언트.
pub struct GoTrueClient {
    base_url: String,
    api_key: HeaderValue,
    service_bearer: HeaderValue,
    client: reqwest::Client,
}

impl std::fmt::Debug for GoTrueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<ProviderUser>,
}

impl GoTrueClient {
    /// 설정에서 클라이언트를 생성합니다.
    ///
    /// # Errors
    ///
    /// 서비스 키에 헤더로 보낼 수 없는 문자가 있으면 에러를 반환합니다.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let key = config.service_key.expose_secret();

        let mut api_key = HeaderValue::from_str(key)
            .map_err(|_| ProviderError::Parse("service key is not a valid header value".into()))?;
        api_key.set_sensitive(true);

        let mut service_bearer = header_bearer(key)?;
        service_bearer.set_sensitive(true);

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
            service_bearer,
            client: reqwest::Client::new(),
        })
    }

    /// 프로바이더 기본 URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn with_api_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", self.api_key.clone())
    }

    fn as_service(&self, request: RequestBuilder) -> RequestBuilder {
        self.with_api_key(request)
            .header(AUTHORIZATION, self.service_bearer.clone())
    }
}

fn header_bearer(token: &str) -> Result<HeaderValue, ProviderError> {
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| ProviderError::Parse("token is not a valid header value".into()))
}

/// 실패 응답 본문에서 사람이 읽을 수 있는 메시지를 추출합니다.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// 성공 응답이면 JSON 본문을, 아니면 `Rejected` 에러를 반환합니다.
async fn json_or_reject(response: Response) -> Result<Value, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()));
    }
    Err(rejection(status, response).await)
}

async fn rejection(status: StatusCode, response: Response) -> ProviderError {
    let body = response.text().await.unwrap_or_default();
    ProviderError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    }
}

fn parse_user(value: Value) -> Result<ProviderUser, ProviderError> {
    serde_json::from_value(value).map_err(|e| ProviderError::Parse(e.to_string()))
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        let request = self
            .client
            .post(self.endpoint("/signup"))
            .json(&json!({ "email": email, "password": password }));

        let body = json_or_reject(self.as_service(request).send().await?).await?;

        // 이메일 확인이 꺼져 있으면 세션과 함께 `user` 객체가, 켜져 있으면 사용자 객체 자체가 온다
        let user = match body.get("user") {
            Some(user) if user.is_object() => user.clone(),
            _ => body,
        };
        parse_user(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser, ProviderError> {
        let request = self
            .client
            .post(self.endpoint("/token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let response = self.with_api_key(request).send().await?;
        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), reason = %error_message(&body), "Provider rejected credentials");
            return Err(ProviderError::InvalidCredentials);
        }

        let mut body = json_or_reject(response).await?;
        let user = body
            .get_mut("user")
            .map(Value::take)
            .ok_or_else(|| ProviderError::Parse("token response has no user".into()))?;

        // 프로바이더 세션 토큰은 보관하지 않는다
        parse_user(user)
    }

    async fn logout(&self, access_token: &str) -> Result<(), ProviderError> {
        let request = self
            .client
            .post(self.endpoint("/logout"))
            .header(AUTHORIZATION, header_bearer(access_token)?);

        let response = self.with_api_key(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let err = rejection(status, response).await;
        warn!(error = %err, "Provider logout failed");
        Err(err)
    }

    async fn health(&self) -> Result<Value, ProviderError> {
        let request = self.client.get(self.endpoint("/health"));
        json_or_reject(self.with_api_key(request).send().await?).await
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, ProviderError> {
        let request = self.client.get(self.endpoint("/admin/users"));
        let body = json_or_reject(self.as_service(request).send().await?).await?;

        let list: UserList =
            serde_json::from_value(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(list.users)
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), ProviderError> {
        let mut url = Url::parse(&self.endpoint("/admin/users"))
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Parse("provider url cannot be a base".into()))?
            .push(user_id);

        let request = self.client.delete(url);

        let response = self.as_service(request).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(rejection(status, response).await)
        }
    }
}
