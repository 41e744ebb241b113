//! 검증된 JSON 본문 추출기.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::error::ApiError;

/// JSON 역직렬화와 `validator` 규칙 검사를 한 번에 수행하는 추출기.
///
/// 본문 누락, Content-Type 오류, JSON 형식 오류, 규칙 위반은 모두
/// [`ApiError::Validation`] (400)으로 거부됩니다. 핸들러는 실행되지 않습니다.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "Request body rejected");
                ApiError::Validation
            })?;

        value.validate().map_err(|errors| {
            debug!(%errors, "Request body failed validation");
            ApiError::Validation
        })?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(email)]
        email: String,
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            post(|ValidatedJson(payload): ValidatedJson<Payload>| async move { payload.email }),
        )
    }

    async fn send(content_type: Option<&str>, body: &str) -> StatusCode {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(value) = content_type {
            builder = builder.header(CONTENT_TYPE, value);
        }
        app()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_accepts_valid_body() {
        let status = send(Some("application/json"), r#"{"email":"a@example.com"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejections_are_bad_request() {
        assert_eq!(
            send(Some("application/json"), r#"{"email":"not-an-email"}"#).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(send(Some("application/json"), "{").await, StatusCode::BAD_REQUEST);
        assert_eq!(send(Some("application/json"), "{}").await, StatusCode::BAD_REQUEST);
        assert_eq!(
            send(None, r#"{"email":"a@example.com"}"#).await,
            StatusCode::BAD_REQUEST
        );
    }
}
