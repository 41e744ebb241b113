//! 설정 관리.
//!
//! 기본값 → 설정 파일 → `AUTHGATE__*` 환경 변수 → 기존 서비스 환경 변수
//! (`SUPABASE_URL`, `JWT_SECRET` 등) 순서로 덮어씁니다.
//! 설정은 시작 시 한 번만 로드되며 이후 변경되지 않습니다.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Access Token 기본 유효 기간 (15분).
pub const DEFAULT_ACCESS_LIFETIME_SECS: i64 = 15 * 60;

/// Refresh Token 기본 유효 기간 (7일).
pub const DEFAULT_REFRESH_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// 토큰 유효 기간 상한 (365일).
pub const MAX_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// 서명 키 최소 길이 (바이트).
pub const MIN_SECRET_LEN: usize = 32;

/// 설정 에러.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("설정 값이 유효하지 않습니다: {0}")]
    Invalid(String),
}

/// `Authorization` 헤더의 `Bearer ` 접두사 처리 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BearerMode {
    /// `Bearer <token>`과 원시 토큰 모두 허용
    #[default]
    Optional,
    /// `Bearer <token>`만 허용
    Required,
    /// 원시 토큰만 허용
    Raw,
}

/// 게이트웨이 전체 설정.
#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// Identity Provider 설정
    pub provider: ProviderConfig,
    /// 토큰 설정
    pub token: TokenConfig,
    /// 정리 도구용 관리자 계정 (선택)
    #[serde(default)]
    pub admin: AdminConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl ServerConfig {
    /// 소켓 주소 반환.
    ///
    /// # Errors
    ///
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Identity Provider(GoTrue) 접속 설정.
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// 프로바이더 기본 URL (예: https://xyz.supabase.co)
    #[serde(default)]
    pub url: String,
    /// 서비스 키
    #[serde(default = "empty_secret", deserialize_with = "deserialize_secret")]
    pub service_key: SecretString,
}

/// 토큰 발급 설정.
#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    /// HS256 서명 키
    #[serde(default = "empty_secret", deserialize_with = "deserialize_secret")]
    pub secret: SecretString,
    /// Access Token 유효 기간 (초)
    pub access_lifetime_secs: i64,
    /// Refresh Token 유효 기간 (초)
    pub refresh_lifetime_secs: i64,
    /// Bearer 접두사 처리 방식
    #[serde(default)]
    pub bearer_mode: BearerMode,
}

/// 관리자 계정 설정.
///
/// 테스트 정리 도구에서만 사용합니다.
#[derive(Debug, Default, Deserialize)]
pub struct AdminConfig {
    /// 관리자 이메일
    #[serde(default)]
    pub email: Option<String>,
    /// 관리자 비밀번호
    #[serde(default, deserialize_with = "deserialize_optional_secret")]
    pub password: Option<SecretString>,
}

impl AdminConfig {
    /// 이메일과 비밀번호가 모두 설정된 경우에만 반환.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.expose_secret())),
            _ => None,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

/// 기존 서비스 환경 변수 → 설정 키 매핑.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("SUPABASE_URL", "provider.url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "provider.service_key"),
    ("JWT_SECRET", "token.secret"),
    ("AUTH_PORT", "server.port"),
    ("ADMIN_EMAIL", "admin.email"),
    ("ADMIN_PASSWORD", "admin.password"),
];

impl GatewayConfig {
    /// 파일과 프로세스 환경 변수에서 설정을 로드하고 검증합니다.
    ///
    /// `path`가 없으면 [`DEFAULT_CONFIG_PATH`]를 선택적으로 읽습니다.
    ///
    /// # Errors
    ///
    /// 로드 실패 또는 필수 값 누락 시 `ConfigError`를 반환합니다.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(path, std::env::vars().collect())
    }

    /// 주어진 환경 변수 맵으로 설정을 로드하고 검증합니다.
    ///
    /// # Errors
    ///
    /// 로드 실패 또는 필수 값 누락 시 `ConfigError`를 반환합니다.
    pub fn load_from(path: Option<&Path>, env: HashMap<String, String>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false),
        };

        let mut builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("token.access_lifetime_secs", DEFAULT_ACCESS_LIFETIME_SECS)?
            .set_default("token.refresh_lifetime_secs", DEFAULT_REFRESH_LIFETIME_SECS)?
            .set_default("token.bearer_mode", "optional")?
            .set_default("provider.url", "")?
            .set_default("provider.service_key", "")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // 파일에서 로드
            .add_source(file)
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("AUTHGATE")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.clone())),
            );

        for (var, key) in LEGACY_ENV_KEYS {
            let value = env.get(*var).filter(|v| !v.is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::info!(
            provider = %config.provider.url,
            port = config.server.port,
            bearer_mode = ?config.token.bearer_mode,
            "Config is valid"
        );

        Ok(config)
    }

    /// 필수 값 검증.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Missing`: 프로바이더 URL, 서비스 키, 서명 키 누락
    /// - `ConfigError::Invalid`: 형식 또는 범위 오류
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.url.trim().is_empty() {
            return Err(ConfigError::Missing("SUPABASE_URL"));
        }
        if !(self.provider.url.starts_with("http://") || self.provider.url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "provider.url must be an http(s) URL: {}",
                self.provider.url
            )));
        }
        if self.provider.service_key.expose_secret().is_empty() {
            return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"));
        }

        let secret = self.token.secret.expose_secret();
        if secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "token.secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if self.token.access_lifetime_secs <= 0 || self.token.refresh_lifetime_secs <= 0 {
            return Err(ConfigError::Invalid(
                "token lifetimes must be positive".to_string(),
            ));
        }
        if self.token.access_lifetime_secs > MAX_LIFETIME_SECS
            || self.token.refresh_lifetime_secs > MAX_LIFETIME_SECS
        {
            return Err(ConfigError::Invalid(format!(
                "token lifetimes must not exceed {} seconds",
                MAX_LIFETIME_SECS
            )));
        }
        if self.token.access_lifetime_secs >= self.token.refresh_lifetime_secs {
            return Err(ConfigError::Invalid(
                "access token lifetime must be shorter than refresh token lifetime".to_string(),
            ));
        }

        if self.admin.email.is_some() != self.admin.password.is_some() {
            return Err(ConfigError::Invalid(
                "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("JWT_SECRET", SECRET),
        ]
    }

    #[test]
    fn test_load_with_legacy_env() {
        let mut vars = required();
        vars.push(("AUTH_PORT", "8081"));
        let config = GatewayConfig::load_from(None, env(&vars)).unwrap();

        assert_eq!(config.provider.url, "https://project.supabase.co");
        assert_eq!(config.provider.service_key.expose_secret(), "service-key");
        assert_eq!(config.token.secret.expose_secret(), SECRET);
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.token.access_lifetime_secs, DEFAULT_ACCESS_LIFETIME_SECS);
        assert_eq!(config.token.refresh_lifetime_secs, DEFAULT_REFRESH_LIFETIME_SECS);
        assert_eq!(config.token.bearer_mode, BearerMode::Optional);
        assert!(config.admin.credentials().is_none());
    }

    #[test]
    fn test_prefixed_env_overrides() {
        let mut vars = required();
        vars.push(("AUTHGATE__TOKEN__BEARER_MODE", "required"));
        vars.push(("AUTHGATE__TOKEN__ACCESS_LIFETIME_SECS", "60"));
        vars.push(("AUTHGATE__LOGGING__FORMAT", "json"));
        let config = GatewayConfig::load_from(None, env(&vars)).unwrap();

        assert_eq!(config.token.bearer_mode, BearerMode::Required);
        assert_eq!(config.token.access_lifetime_secs, 60);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_secret_fails_fast() {
        let vars = vec![
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ];
        let err = GatewayConfig::load_from(None, env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_missing_provider_fails_fast() {
        let vars = vec![("JWT_SECRET", SECRET)];
        let err = GatewayConfig::load_from(None, env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_URL")));
    }

    #[test]
    fn test_missing_service_key_fails_fast() {
        let vars = vec![
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("JWT_SECRET", SECRET),
        ];
        let err = GatewayConfig::load_from(None, env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY")));
    }

    #[test]
    fn test_oversized_lifetime_rejected() {
        let mut vars = required();
        vars.push(("AUTHGATE__TOKEN__REFRESH_LIFETIME_SECS", "10000000000000000"));
        let err = GatewayConfig::load_from(None, env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let mut vars = required();
        vars.push((
            "AUTHGATE__TOKEN__REFRESH_LIFETIME_SECS",
            "31536001", // 365일 + 1초
        ));
        assert!(GatewayConfig::load_from(None, env(&vars)).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let vars = vec![
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("JWT_SECRET", "short"),
        ];
        let err = GatewayConfig::load_from(None, env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_lifetime_order_checked() {
        let mut vars = required();
        vars.push(("AUTHGATE__TOKEN__ACCESS_LIFETIME_SECS", "604800"));
        let err = GatewayConfig::load_from(None, env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_admin_credentials() {
        let mut vars = required();
        vars.push(("ADMIN_EMAIL", "admin@example.com"));
        vars.push(("ADMIN_PASSWORD", "admin-password"));
        let config = GatewayConfig::load_from(None, env(&vars)).unwrap();

        assert_eq!(
            config.admin.credentials(),
            Some(("admin@example.com", "admin-password"))
        );

        let mut vars = required();
        vars.push(("ADMIN_EMAIL", "admin@example.com"));
        assert!(GatewayConfig::load_from(None, env(&vars)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "authgate-config-{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(
            &path,
            format!(
                r#"
[server]
host = "0.0.0.0"
port = 9000

[provider]
url = "http://localhost:9999"
service_key = "file-key"

[token]
secret = "{SECRET}"
bearer_mode = "raw"
"#
            ),
        )
        .unwrap();

        let result = GatewayConfig::load_from(Some(&path), HashMap::new());
        std::fs::remove_file(&path).ok();
        let config = result.unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.provider.url, "http://localhost:9999");
        assert_eq!(config.token.bearer_mode, BearerMode::Raw);
        assert_eq!(config.server.socket_addr().unwrap().port(), 9000);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let path = std::env::temp_dir().join("authgate-does-not-exist.toml");
        let err = GatewayConfig::load_from(Some(&path), env(&required())).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
