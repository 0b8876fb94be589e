//! 캠퍼스 채용 플랫폼 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 로그인, 비밀번호 관리, 대학 조회, 헬스 체크 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use placement_api::metrics::setup_metrics_recorder;
use placement_api::middleware::metrics_layer;
use placement_api::repository::{run_migrations, PgStore};
use placement_api::routes::{create_api_router, AuthRateLimits};
use placement_api::state::AppState;
use placement_core::{
    init_logging, AppConfig, DatabaseConfig, LogConfig, MemoryStore, ServerConfig, TokenIssuer,
};

/// Rate Limiter 버킷 정리 주기
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Prometheus 메트릭 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// CORS 레이어 생성.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        // 개발: 모든 origin 허용
        warn!("server.cors_origins not set, allowing any origin (development mode)");
        AllowOrigin::any()
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    limits: Option<&AuthRateLimits>,
    config: &ServerConfig,
) -> Router {
    // 메트릭 라우터 (별도 상태)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let api_router = create_api_router(limits).with_state(state);

    Router::new()
        .merge(metrics_router)
        .merge(api_router)
        // 메트릭 미들웨어 (모든 요청에 적용)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(cors_layer(config))
}

/// 데이터베이스 연결.
///
/// URL이 없으면 `None`을 반환하고 서버는 인메모리 저장소로 동작합니다.
async fn connect_database(config: &DatabaseConfig) -> anyhow::Result<Option<sqlx::PgPool>> {
    let Some(url) = config
        .url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
    else {
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(&url)
        .await
        .context("Failed to connect to database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!("Connected to PostgreSQL successfully");
    Ok(Some(pool))
}

/// 애플리케이션 상태 생성.
async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let tokens = Arc::new(TokenIssuer::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl(),
    ));
    let policy = config.auth.lockout_policy();
    let reset_ttl = config.auth.reset_token_ttl();

    let state = match connect_database(&config.database).await? {
        Some(pool) => {
            let store = Arc::new(PgStore::new(pool.clone()));
            AppState::new(store.clone(), store, tokens, policy, reset_ttl)?.with_db_pool(pool)
        }
        None => {
            warn!("No database configured, using in-memory store (data is lost on restart)");
            AppState::in_memory(MemoryStore::new(), tokens, policy, reset_ttl)?
        }
    };

    if let Some(bootstrap) = &config.auth.bootstrap {
        let created = state
            .auth
            .bootstrap_superadmin(
                &bootstrap.username,
                &bootstrap.email,
                bootstrap.password.expose_secret(),
            )
            .await?;
        if created {
            info!(username = %bootstrap.username, "Bootstrap superadmin created");
        }
    }

    Ok(state)
}

/// Rate Limiter 버킷 정리 태스크.
fn spawn_rate_limit_cleanup(limits: AuthRateLimits, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => limits.cleanup().await,
                _ = shutdown.cancelled() => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("Failed to load configuration")?;

    init_logging(LogConfig::from(&config.logging).with_env_overrides())?;

    info!("Starting Placement API server...");

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "소켓 주소 설정이 유효하지 않습니다. server.host, server.port 설정을 확인하세요."
            );
            e
        })?;

    let state = Arc::new(create_app_state(&config).await?);
    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        "Application state initialized"
    );

    let shutdown_token = CancellationToken::new();

    let limits = AuthRateLimits::from_settings(&config.rate_limit);
    match &limits {
        Some(limits) => {
            info!(
                login_max_attempts = config.rate_limit.login_max_attempts,
                reset_max_attempts = config.rate_limit.reset_max_attempts,
                "Auth rate limiting enabled"
            );
            spawn_rate_limit_cleanup(limits.clone(), shutdown_token.clone());
        }
        None => warn!("Auth rate limiting DISABLED (rate_limit.enabled = false)"),
    }

    let app = create_router(state, metrics_handle, limits.as_ref(), &config.server);

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
    .await?;

    // 백그라운드 태스크 종료
    shutdown_token.cancel();
    info!("Server stopped gracefully");

    Ok(())
}

async fn shutdown_signal(shutdown_token: CancellationToken) {
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
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
