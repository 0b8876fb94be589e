//! 인증 endpoint.
//!
//! 로그인, 내 정보 조회, 비밀번호 변경/재설정을 제공합니다.
//!
//! # 엔드포인트
//!
//! - `POST /api/auth/login` - 로그인 (로그인 Rate Limit 적용)
//! - `GET /api/auth/me` - 내 계정 정보
//! - `POST /api/auth/change-password` - 비밀번호 변경
//! - `POST /api/auth/forgot-password` - 재설정 토큰 요청 (재설정 Rate Limit 적용)
//! - `POST /api/auth/reset-password` - 재설정 토큰으로 비밀번호 변경 (재설정 Rate Limit 적용)

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use placement_core::{AccountProfile, AuthError, LoginOutcome, RateLimitSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use crate::auth::JwtAuth;
use crate::error::{api_error, validation_error, ApiResult};
use crate::metrics::{record_login, record_password_reset};
use crate::middleware::{rate_limit_middleware, RateLimitConfig, RateLimitState};
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64, message = "사용자 이름은 1-64자여야 합니다"))]
    pub username: String,
    #[validate(length(min = 1, max = 256, message = "비밀번호를 입력하세요"))]
    pub password: String,
}

/// 비밀번호 변경 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 256, message = "현재 비밀번호를 입력하세요"))]
    pub current_password: String,
    #[validate(length(max = 256, message = "비밀번호가 너무 깁니다"))]
    pub new_password: String,
}

/// 비밀번호 재설정 토큰 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(length(min = 1, max = 64, message = "사용자 이름은 1-64자여야 합니다"))]
    pub username: String,
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,
}

/// 비밀번호 재설정 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, max = 128, message = "재설정 토큰이 필요합니다"))]
    pub token: String,
    #[validate(length(max = 256, message = "비밀번호가 너무 깁니다"))]
    pub new_password: String,
}

/// 단순 확인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

const RESET_ACK: &str = "입력한 정보와 일치하는 계정이 있으면 재설정 안내가 전달됩니다";

// ==================== Rate Limit ====================

/// 인증 endpoint Rate Limiter 묶음.
///
/// 서버는 주기적으로 [`AuthRateLimits::cleanup`]을 호출해 오래된 버킷을
/// 정리합니다.
#[derive(Clone)]
pub struct AuthRateLimits {
    pub login: RateLimitState,
    pub password_reset: RateLimitState,
}

impl AuthRateLimits {
    /// 설정에서 생성. 비활성화되어 있으면 `None`.
    pub fn from_settings(settings: &RateLimitSettings) -> Option<Self> {
        settings.enabled.then(|| Self {
            login: RateLimitState::new("login", RateLimitConfig::login(settings)),
            password_reset: RateLimitState::new(
                "password_reset",
                RateLimitConfig::password_reset(settings),
            ),
        })
    }

    /// 만료된 버킷 정리.
    pub async fn cleanup(&self) {
        self.login.limiter().cleanup().await;
        self.password_reset.limiter().cleanup().await;
    }
}

// ==================== 핸들러 ====================

/// 로그인.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginOutcome>> {
    request.validate().map_err(validation_error)?;

    match state.auth.login(&request.username, &request.password).await {
        Ok(outcome) => {
            record_login("success");
            Ok(Json(outcome))
        }
        Err(e) => {
            record_login(match &e {
                AuthError::NotFound | AuthError::InvalidCredentials => "invalid_credentials",
                AuthError::AccountLocked { .. } => "locked",
                AuthError::AccountInactive | AuthError::CollegeInactive => "inactive",
                _ => "error",
            });
            Err(api_error(e))
        }
    }
}

/// 내 계정 정보.
///
/// GET /api/auth/me
pub async fn me(
    JwtAuth(claims): JwtAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<AccountProfile>> {
    let account_id = claims.account_id().map_err(api_error)?;
    let profile = state.auth.profile(account_id).await.map_err(api_error)?;
    Ok(Json(profile))
}

/// 비밀번호 변경.
///
/// POST /api/auth/change-password
pub async fn change_password(
    JwtAuth(claims): JwtAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    request.validate().map_err(validation_error)?;

    let account_id = claims.account_id().map_err(api_error)?;
    state
        .auth
        .change_password(account_id, &request.current_password, &request.new_password)
        .await
        .map_err(api_error)?;

    Ok(Json(MessageResponse::new("비밀번호가 변경되었습니다")))
}

/// 비밀번호 재설정 토큰 요청.
///
/// 계정 존재 여부를 드러내지 않도록 일치하는 계정이 없어도 같은 응답을
/// 반환합니다. 토큰 전달은 외부 채널이 담당합니다.
///
/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    request.validate().map_err(validation_error)?;

    match state
        .auth
        .request_password_reset(&request.username, &request.email)
        .await
    {
        Ok(_token) => {
            record_password_reset("requested");
            debug!("Reset token issued, delivery is external");
        }
        Err(AuthError::NotFound) => {
            record_password_reset("unmatched");
        }
        Err(e) => return Err(api_error(e)),
    }

    Ok(Json(MessageResponse::new(RESET_ACK)))
}

/// 재설정 토큰으로 비밀번호 변경.
///
/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    request.validate().map_err(validation_error)?;

    match state
        .auth
        .reset_password(&request.token, &request.new_password)
        .await
    {
        Ok(()) => {
            record_password_reset("completed");
            info!("Password reset via token");
            Ok(Json(MessageResponse::new("비밀번호가 재설정되었습니다")))
        }
        Err(e) => {
            record_password_reset("rejected");
            Err(api_error(e))
        }
    }
}

// ==================== 라우터 ====================

/// 인증 라우터 생성.
///
/// `limits`가 주어지면 로그인과 재설정 route에 각각의 Rate Limiter를
/// 적용합니다.
pub fn auth_router(limits: Option<&AuthRateLimits>) -> Router<Arc<AppState>> {
    // 비밀번호를 확인하는 경로는 로그인 한도를 함께 사용
    let mut credential_routes = Router::new()
        .route("/login", post(login))
        .route("/change-password", post(change_password));
    let mut reset_routes = Router::new()
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password));

    if let Some(limits) = limits {
        credential_routes = credential_routes.route_layer(middleware::from_fn_with_state(
            limits.login.clone(),
            rate_limit_middleware,
        ));
        reset_routes = reset_routes.route_layer(middleware::from_fn_with_state(
            limits.password_reset.clone(),
            rate_limit_middleware,
        ));
    }

    Router::new()
        .route("/me", get(me))
        .merge(credential_routes)
        .merge(reset_routes)
}
