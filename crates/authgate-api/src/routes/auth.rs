//! 인증 endpoint.
//!
//! 가입/로그인은 프로바이더에 위임하고, 클라이언트에 전달하는 토큰은
//! 게이트웨이의 `TokenCodec`이 직접 발급합니다.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/auth/signup` - 가입
//! - `POST /api/v1/auth/login` - 로그인, 토큰 쌍 발급
//! - `POST /api/v1/auth/refresh` - Refresh Token으로 토큰 쌍 재발급
//! - `POST /api/v1/auth/logout` - 로그아웃 (인증 필요)

use std::sync::Arc;

use authgate_core::{Identity, TokenKind, TokenPair};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

use crate::auth::{session_middleware, Authenticated};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::metrics::{record_provider_call, record_token_issued, record_token_rejection};
use crate::provider::ProviderError;
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 가입/로그인 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// 토큰 재발급 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// 가입 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub user_id: String,
    pub email: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// 토큰 재발급 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// 단순 메시지 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ==================== 핸들러 ====================

fn provider_outcome<T>(operation: &'static str, result: &Result<T, ProviderError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    record_provider_call(operation, outcome);
}

/// Access/Refresh 토큰 쌍을 발급합니다.
fn issue_tokens(state: &AppState, identity: &Identity) -> ApiResult<TokenPair> {
    let pair = state.codec.issue_pair(identity).map_err(|err| {
        error!(error = %err, subject = %identity.subject, "Token issuance failed");
        ApiError::Internal("Failed to generate tokens")
    })?;

    record_token_issued(TokenKind::Access.as_str());
    record_token_issued(TokenKind::Refresh.as_str());
    Ok(pair)
}

/// 신규 사용자 가입.
///
/// POST /api/v1/auth/signup
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state
        .provider
        .sign_up(&request.email, &request.password)
        .await;
    provider_outcome("sign_up", &result);

    let user = result.map_err(|err| {
        warn!(error = %err, "Sign-up failed");
        ApiError::Upstream("Failed to sign up user")
    })?;

    info!(subject = %user.id, "User signed up");

    let email = if user.email.is_empty() {
        request.email
    } else {
        user.email
    };

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            user_id: user.id,
            email,
        }),
    ))
}

/// 로그인.
///
/// POST /api/v1/auth/login
///
/// 프로바이더에서 자격 증명을 확인한 뒤 게이트웨이 토큰 쌍을 발급합니다.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let result = state
        .provider
        .sign_in(&request.email, &request.password)
        .await;
    provider_outcome("sign_in", &result);

    let user = result.map_err(|err| {
        if err.is_client_error() {
            info!(error = %err, "Login rejected");
            ApiError::Unauthenticated("Invalid credentials")
        } else {
            error!(error = %err, "Login failed");
            ApiError::Upstream("Failed to log in")
        }
    })?;

    let email = if user.email.is_empty() {
        request.email
    } else {
        user.email
    };
    let identity = Identity::new(user.id, email, user.role);
    let pair = issue_tokens(&state, &identity)?;

    info!(subject = %identity.subject, "User logged in");

    Ok(Json(LoginResponse {
        user_id: identity.subject,
        email: identity.email,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// 토큰 재발급.
///
/// POST /api/v1/auth/refresh
///
/// 프로바이더를 거치지 않고 로컬에서 검증합니다. 기존 Refresh Token은
/// 만료 시까지 유효합니다.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = state
        .codec
        .verify(&request.refresh_token, TokenKind::Refresh)
        .map_err(|err| {
            warn!(reason = err.reason(), "Refresh token rejected");
            record_token_rejection(err.reason());
            ApiError::Unauthenticated("Invalid refresh token")
        })?;

    let identity = claims.identity();
    let pair = issue_tokens(&state, &identity)?;

    info!(subject = %identity.subject, "Tokens refreshed");

    Ok(Json(RefreshResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// 로그아웃.
///
/// POST /api/v1/auth/logout
///
/// 요청자의 토큰으로 프로바이더 세션 종료를 요청합니다. 게이트웨이 토큰은
/// 상태가 없으므로 만료 시까지 유효합니다.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Authenticated(session): Authenticated,
) -> ApiResult<Json<MessageResponse>> {
    let result = state.provider.logout(session.bearer()).await;
    provider_outcome("logout", &result);

    result.map_err(|err| {
        error!(error = %err, subject = %session.subject, "Logout failed");
        ApiError::Upstream("Failed to log out")
    })?;

    info!(subject = %session.subject, "User logged out");

    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

// ==================== 라우터 ====================

/// 인증 라우터 생성.
///
/// `/logout`만 세션 미들웨어 뒤에 있습니다.
pub fn auth_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state, session_middleware));

    Router::new()
        .route("/signup", post(sign_up))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .merge(protected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_state_with, MockIdentityProvider, TestClock};
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn setup() -> (Router, Arc<MockIdentityProvider>, Arc<AppState>) {
        let provider = Arc::new(
            MockIdentityProvider::new()
                .with_user("alice@example.com", "correct-horse")
                .await,
        );
        let state = Arc::new(test_state_with(provider.clone(), &TestClock::new()));
        let app = Router::new()
            .nest("/auth", auth_router(state.clone()))
            .with_state(state.clone());
        (app, provider, state)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_sign_up_created() {
        let (app, provider, _) = setup().await;

        let (status, body) = post_json(
            app,
            "/auth/signup",
            json!({ "email": "bob@example.com", "password": "password123" }),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "bob@example.com");
        assert!(!body["user_id"].as_str().unwrap().is_empty());
        assert_eq!(provider.sign_up_calls(), 1);
    }

    #[tokio::test]
    async fn test_sign_up_short_password_never_reaches_provider() {
        let (app, provider, _) = setup().await;

        let (status, body) = post_json(
            app,
            "/auth/signup",
            json!({ "email": "bob@example.com", "password": "short" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid request payload" }));
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_sign_up_invalid_email() {
        let (app, provider, _) = setup().await;

        let (status, _) = post_json(
            app,
            "/auth/signup",
            json!({ "email": "not-an-email", "password": "password123" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_is_upstream_error() {
        let (app, _, _) = setup().await;

        let (status, body) = post_json(
            app,
            "/auth/signup",
            json!({ "email": "alice@example.com", "password": "password123" }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to sign up user" }));
    }

    #[tokio::test]
    async fn test_login_issues_gateway_tokens() {
        let (app, _, state) = setup().await;

        let (status, body) = post_json(
            app,
            "/auth/login",
            json!({ "email": "alice@example.com", "password": "correct-horse" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "alice@example.com");

        let access = state
            .codec
            .verify(body["access_token"].as_str().unwrap(), TokenKind::Access)
            .unwrap();
        assert_eq!(access.sub, body["user_id"].as_str().unwrap());
        assert_eq!(access.role.as_deref(), Some("authenticated"));

        assert!(state
            .codec
            .verify(body["refresh_token"].as_str().unwrap(), TokenKind::Refresh)
            .is_ok());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (app, provider, _) = setup().await;

        let (status, body) = post_json(
            app,
            "/auth/login",
            json!({ "email": "alice@example.com", "password": "wrong-password" }),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid credentials" }));
        assert!(body.get("access_token").is_none());
        assert_eq!(provider.sign_in_calls(), 1);
    }

    #[tokio::test]
    async fn test_login_rate_limited_is_upstream_error() {
        let (app, provider, _) = setup().await;
        provider.reject_sign_in_with(429);

        let (status, body) = post_json(
            app.clone(),
            "/auth/login",
            json!({ "email": "alice@example.com", "password": "correct-horse" }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to log in" }));

        provider.reject_sign_in_with(422);
        let (status, body) = post_json(
            app,
            "/auth/login",
            json!({ "email": "alice@example.com", "password": "correct-horse" }),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid credentials" }));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let (app, _, state) = setup().await;
        let pair = state
            .codec
            .issue_pair(&Identity::new("user-1", "alice@example.com", None))
            .unwrap();

        let (status, body) = post_json(
            app,
            "/auth/refresh",
            json!({ "refresh_token": pair.access_token }),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid refresh token" }));
    }

    #[tokio::test]
    async fn test_refresh_reissues_pair_for_same_identity() {
        let (app, provider, state) = setup().await;
        let identity = Identity::new("user-1", "alice@example.com", Some("authenticated".into()));
        let pair = state.codec.issue_pair(&identity).unwrap();

        let (status, body) = post_json(
            app,
            "/auth/refresh",
            json!({ "refresh_token": pair.refresh_token }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let access = body["access_token"].as_str().unwrap();
        assert_ne!(access, pair.access_token);

        let claims = state.codec.verify(access, TokenKind::Access).unwrap();
        assert_eq!(claims.identity(), identity);
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_empty_token_is_bad_request() {
        let (app, _, _) = setup().await;

        let (status, _) = post_json(app, "/auth/refresh", json!({ "refresh_token": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_requires_session() {
        let (app, provider, _) = setup().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(provider.logout_calls(), 0);
    }

    #[tokio::test]
    async fn test_logout_forwards_caller_token() {
        let (app, provider, state) = setup().await;
        let token = state
            .codec
            .issue(&Identity::new("user-1", "alice@example.com", None), TokenKind::Access)
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/logout")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(provider.logged_out_tokens().await, vec![token]);
    }
}
