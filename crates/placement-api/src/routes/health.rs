//! 헬스 체크 endpoint.
//!
//! - `GET /health`: 프로세스 생존 확인 (liveness)
//! - `GET /health/ready`: 저장소 왕복 조회로 요청 처리 가능 여부 확인 (readiness)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::AppState;

/// 개별 점검 제한 시간
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// readiness 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// "ready" | "degraded"
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    /// 점검 시각 (RFC 3339)
    pub checked_at: String,
    pub components: Components,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Components {
    /// PostgreSQL 연결 (인메모리 저장소면 "not_configured")
    pub database: Probe,
    /// 계정/대학 저장소 조회
    pub store: Probe,
}

/// 점검 결과.
#[derive(Debug, Serialize, Deserialize)]
pub struct Probe {
    /// "up" | "down" | "not_configured"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Probe {
    fn not_configured() -> Self {
        Self {
            status: "not_configured".to_string(),
            backend: None,
            latency_ms: None,
            error: None,
        }
    }

    fn is_down(&self) -> bool {
        self.status == "down"
    }

    /// 제한 시간 안에 `check`를 실행하고 결과를 기록합니다.
    async fn run<F, T, E>(backend: &str, check: F) -> Self
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let started = Instant::now();
        let outcome = tokio::time::timeout(PROBE_TIMEOUT, check).await;
        let latency_ms = Some(started.elapsed().as_millis() as u64);

        let error = match outcome {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("timed out after {}s", PROBE_TIMEOUT.as_secs())),
        };

        Self {
            status: if error.is_some() { "down" } else { "up" }.to_string(),
            backend: Some(backend.to_string()),
            latency_ms,
            error,
        }
    }
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /health/ready
///
/// 저장소에서 대학 목록을 실제로 읽어 봅니다. 하나라도 실패하면 503과
/// "degraded"를 반환합니다.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => {
            Probe::run("postgres", sqlx::query("SELECT 1").execute(pool)).await
        }
        None => Probe::not_configured(),
    };

    let backend = if state.db_pool.is_some() { "postgres" } else { "memory" };
    let store = Probe::run(backend, state.colleges.list_colleges()).await;

    let degraded = database.is_down() || store.is_down();
    if degraded {
        warn!(
            database = ?database.error,
            store = ?store.error,
            "Readiness check failed"
        );
    }

    let response = ReadinessResponse {
        status: if degraded { "degraded" } else { "ready" }.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        checked_at: chrono::Utc::now().to_rfc3339(),
        components: Components { database, store },
    };
    let code = if degraded {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
