//! 대학 조회 endpoint.
//!
//! # 엔드포인트
//!
//! - `GET /api/colleges` - 전체 대학 목록 (슈퍼관리자 전용)
//! - `GET /api/colleges/{college_id}` - 대학 상세 (소속 대학 또는 슈퍼관리자)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use placement_core::{auth::authorize, College, Role};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::auth::{JwtAuth, SuperAdminAuth};
use crate::error::{api_error, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 대학 목록 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollegeListResponse {
    pub colleges: Vec<College>,
    pub total: usize,
}

/// 전체 대학 목록.
///
/// GET /api/colleges
pub async fn list_colleges(
    SuperAdminAuth(_claims): SuperAdminAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CollegeListResponse>> {
    let colleges = state
        .colleges
        .list_colleges()
        .await
        .map_err(|e| api_error(e.into()))?;

    Ok(Json(CollegeListResponse {
        total: colleges.len(),
        colleges,
    }))
}

/// 대학 상세.
///
/// 다른 대학 소속 계정의 요청은 대학 존재 여부와 관계없이 403입니다.
///
/// GET /api/colleges/{college_id}
pub async fn get_college(
    JwtAuth(claims): JwtAuth,
    State(state): State<Arc<AppState>>,
    Path(college_id): Path<Uuid>,
) -> ApiResult<Json<College>> {
    if let Err(e) = authorize(&claims, &Role::ALL, Some(college_id)) {
        warn!(
            username = %claims.username,
            college_id = %college_id,
            "Cross-college access denied"
        );
        return Err(api_error(e));
    }

    let college = state
        .colleges
        .find_college(college_id)
        .await
        .map_err(|e| api_error(e.into()))?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiErrorResponse::new(
                    "NOT_FOUND",
                    format!("College not found: {}", college_id),
                )),
            )
        })?;

    Ok(Json(college))
}

/// 대학 라우터 생성.
pub fn colleges_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_colleges))
        .route("/{college_id}", get(get_college))
}
