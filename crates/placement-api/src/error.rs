//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//! 코어의 [`AuthError`]는 [`api_error`]를 통해 HTTP 상태 코드와 에러 코드로
//! 변환됩니다.

use axum::{http::StatusCode, Json};
use placement_core::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "INVALID_CREDENTIALS",
///   "message": "아이디 또는 비밀번호가 올바르지 않습니다",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_CREDENTIALS", "FORBIDDEN")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    ///
    /// # Example
    ///
    /// ```
    /// use placement_api::error::ApiErrorResponse;
    ///
    /// let error = ApiErrorResponse::new("NOT_FOUND", "College not found");
    /// ```
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

// ==================== Result Type Alias ====================

/// API 핸들러 에러 타입.
pub type ApiError = (StatusCode, Json<ApiErrorResponse>);

/// API 핸들러 Result 타입 별칭.
///
/// # Example
///
/// ```ignore
/// async fn me(
///     JwtAuth(claims): JwtAuth,
///     State(state): State<Arc<AppState>>,
/// ) -> ApiResult<Json<AccountProfile>> {
///     let account_id = claims.account_id().map_err(api_error)?;
///     let profile = state.auth.profile(account_id).await.map_err(api_error)?;
///     Ok(Json(profile))
/// }
/// ```
pub type ApiResult<T> = Result<T, ApiError>;

// ==================== AuthError 변환 ====================

/// 인증 에러의 HTTP 상태 코드와 에러 코드.
///
/// 존재하지 않는 사용자와 비밀번호 불일치는 같은 상태 코드, 코드,
/// 메시지를 사용합니다.
pub fn status_and_code(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::NotFound | AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
        }
        AuthError::AccountLocked { .. } => (StatusCode::LOCKED, "ACCOUNT_LOCKED"),
        AuthError::Expired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
        AuthError::Malformed => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
        AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        AuthError::AccountInactive => (StatusCode::FORBIDDEN, "ACCOUNT_INACTIVE"),
        AuthError::CollegeInactive => (StatusCode::FORBIDDEN, "COLLEGE_INACTIVE"),
        AuthError::MissingCollege => (StatusCode::BAD_REQUEST, "COLLEGE_REQUIRED"),
        AuthError::WeakPassword(_) => (StatusCode::BAD_REQUEST, "WEAK_PASSWORD"),
        AuthError::InvalidResetToken => (StatusCode::BAD_REQUEST, "INVALID_RESET_TOKEN"),
        AuthError::Token(_) | AuthError::Password(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
        AuthError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
    }
}

/// 인증 에러를 API 에러 응답으로 변환.
///
/// 내부 에러의 상세 내용은 로그에만 남기고 응답에는 일반 메시지만
/// 포함합니다.
pub fn api_error(err: AuthError) -> ApiError {
    let (status, code) = status_and_code(&err);

    let body = match &err {
        AuthError::AccountLocked { until } => ApiErrorResponse::with_details(
            code,
            err.to_string(),
            serde_json::json!({ "locked_until": until }),
        ),
        AuthError::WeakPassword(reason) => ApiErrorResponse::new(code, *reason),
        AuthError::Store(e) => {
            tracing::error!(error = %e, "Store unavailable");
            ApiErrorResponse::new(code, "일시적으로 요청을 처리할 수 없습니다")
        }
        AuthError::Token(_) | AuthError::Password(_) => {
            tracing::error!(error = %err, "Internal authentication failure");
            ApiErrorResponse::new(code, "내부 오류가 발생했습니다")
        }
        _ => ApiErrorResponse::new(code, err.to_string()),
    };

    (status, Json(body))
}

/// 요청 본문 검증 실패 응답.
pub fn validation_error(errors: validator::ValidationErrors) -> ApiError {
    let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::with_details(
            "VALIDATION_ERROR",
            "요청 값이 올바르지 않습니다",
            details,
        )),
    )
}
