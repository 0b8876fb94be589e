//! 캠퍼스 채용 플랫폼 접근 제어 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - JWT 인증 추출기와 대학(테넌트) 격리
//! - 인증 endpoint Rate Limiting
//! - PostgreSQL 계정/대학 저장소
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT 인증 추출기
//! - [`repository`]: PostgreSQL 저장소
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{JwtAuth, JwtAuthError, SuperAdminAuth};
pub use error::{api_error, ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use repository::{run_migrations, PgStore};
pub use routes::{create_api_router, AuthRateLimits};
pub use state::AppState;
