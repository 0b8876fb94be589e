//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/auth` - 로그인, 내 정보, 비밀번호 변경/재설정
//! - `/api/colleges` - 대학 조회 (테넌트 격리)

pub mod auth;
pub mod colleges;
pub mod health;

pub use auth::{
    auth_router, AuthRateLimits, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    MessageResponse, ResetPasswordRequest,
};
pub use colleges::{colleges_router, CollegeListResponse};
pub use health::{health_router, Components, Probe, ReadinessResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
/// `limits`가 `None`이면 인증 endpoint에 Rate Limit을 적용하지 않습니다.
pub fn create_api_router(limits: Option<&AuthRateLimits>) -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        .nest("/api/auth", auth_router(limits))
        .nest("/api/colleges", colleges_router())
}
