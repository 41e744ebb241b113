//! 인증 게이트웨이 API 서버 진입점.
//!
//! 설정을 로드하고 검증한 뒤 Axum 서버를 실행합니다. 설정이 유효하지 않으면
//! 리스너를 열기 전에 종료합니다.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use authgate_api::{create_api_router, metrics_layer, setup_metrics_recorder, AppState, GoTrueClient};
use authgate_core::{init_logging, GatewayConfig, LogConfig, TokenCodec};

/// CORS 설정.
///
/// `CORS_ORIGINS`(쉼표 구분)가 있으면 해당 origin만, 없으면 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = std::env::var("CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        warn!("CORS_ORIGINS not set, allowing any origin");
        layer.allow_origin(AllowOrigin::any())
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        // 와일드카드 origin과 자격 증명은 함께 쓸 수 없다
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    create_api_router(state)
        .merge(metrics_router)
        .layer(middleware::from_fn(metrics_layer))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Ctrl+C 또는 SIGTERM 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => warn!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 설정 로드 (로깅 설정도 여기서 오므로 실패는 stderr로 보고)
    let config_path = std::env::var_os("AUTHGATE_CONFIG").map(PathBuf::from);
    let config = match GatewayConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(LogConfig::from(&config.logging))?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting auth gateway...");

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    let addr = config.server.socket_addr().map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "Invalid listen address"
        );
        e
    })?;

    let provider = GoTrueClient::new(&config.provider)?;
    info!(url = provider.base_url(), "Identity provider client initialized");

    let codec = TokenCodec::from_config(&config.token)?;
    let state = Arc::new(
        AppState::new(codec, Arc::new(provider)).with_bearer_mode(config.token.bearer_mode),
    );

    let app = create_router(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Auth gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
