//! Axum용 JWT 인증 추출기.
//!
//! 보호된 핸들러는 인자에 추출기를 선언하는 것만으로 토큰 검증과 역할
//! 확인을 거칩니다. 소속 대학 확인은 핸들러가 대상 리소스를 알고 난 뒤
//! [`placement_core::auth::authorize`]로 수행합니다.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use placement_core::{auth::authorize, AuthError, Claims, Role};

use crate::error::ApiErrorResponse;
use crate::metrics::record_token_rejection;
use crate::state::AppState;

/// JWT 인증 추출기.
///
/// Axum 핸들러에서 인증된 사용자 정보를 추출합니다.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(
///     JwtAuth(claims): JwtAuth,
/// ) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Claims);

/// JWT 인증 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
    #[error("접근 권한이 없습니다")]
    Forbidden,
}

impl From<AuthError> for JwtAuthError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Expired => JwtAuthError::TokenExpired,
            AuthError::Forbidden => JwtAuthError::Forbidden,
            _ => JwtAuthError::InvalidToken,
        }
    }
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            JwtAuthError::MissingToken => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            JwtAuthError::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "INVALID_AUTH_HEADER"),
            JwtAuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            JwtAuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            JwtAuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };

        (status, Json(ApiErrorResponse::new(code, self.to_string()))).into_response()
    }
}

impl<S> FromRequestParts<S> for JwtAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = JwtAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Authorization 헤더에서 토큰 추출
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(JwtAuthError::MissingToken)?;

        // Bearer 토큰 형식 확인
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(JwtAuthError::InvalidAuthHeader)?;

        let app_state = Arc::<AppState>::from_ref(state);
        let claims = app_state.tokens.validate(token).map_err(|e| {
            record_token_rejection(match e {
                AuthError::Expired => "expired",
                _ => "invalid",
            });
            e
        })?;

        Ok(JwtAuth(claims))
    }
}

/// 역할 확인.
///
/// # Returns
///
/// 역할이 `roles`에 포함되면 Ok(()), 아니면 Err(JwtAuthError::Forbidden)
pub fn require_roles(roles: &[Role], claims: &Claims) -> Result<(), JwtAuthError> {
    authorize(claims, roles, None).map_err(JwtAuthError::from)
}

/// 슈퍼관리자 권한을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct SuperAdminAuth(pub Claims);

impl<S> FromRequestParts<S> for SuperAdminAuth
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = JwtAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let JwtAuth(claims) = JwtAuth::from_request_parts(parts, state).await?;
        require_roles(&[Role::SuperAdmin], &claims)?;
        Ok(SuperAdminAuth(claims))
    }
}
