//! 권한 게이트.
//!
//! 검증된 Claims를 기준으로 역할과 소속 대학을 판단합니다.
//! 모든 함수는 상태가 없고 부수 효과가 없습니다.

use uuid::Uuid;

use super::Claims;
use crate::domain::Role;
use crate::error::{AuthError, AuthResult};

/// 요청 허용 여부 판단.
///
/// # Arguments
///
/// * `claims` - 검증된 토큰 Claims
/// * `required_roles` - 허용되는 역할 목록
/// * `resource_college` - 접근 대상 리소스의 소속 대학
///
/// # Errors
///
/// - 역할이 `required_roles`에 없으면 `AuthError::Forbidden`
/// - 슈퍼관리자가 아니고 `resource_college`가 자신의 대학과 다르면
///   `AuthError::Forbidden`
pub fn authorize(
    claims: &Claims,
    required_roles: &[Role],
    resource_college: Option<Uuid>,
) -> AuthResult<()> {
    if !required_roles.contains(&claims.role) {
        return Err(AuthError::Forbidden);
    }

    match resource_college {
        Some(_) if claims.is_superadmin() => Ok(()),
        Some(college) if claims.college_id == Some(college) => Ok(()),
        Some(_) => Err(AuthError::Forbidden),
        None => Ok(()),
    }
}

/// 요청이 다룰 대학 범위 결정.
///
/// - 슈퍼관리자: 요청한 대학 그대로 (`None`이면 전체)
/// - 그 외: 요청이 없으면 자신의 대학, 다른 대학을 요청하면 거부
pub fn resolve_college_scope(claims: &Claims, requested: Option<Uuid>) -> AuthResult<Option<Uuid>> {
    if claims.is_superadmin() {
        return Ok(requested);
    }

    let own = claims.college_id.ok_or(AuthError::Forbidden)?;
    match requested {
        Some(college) if college != own => Err(AuthError::Forbidden),
        _ => Ok(Some(own)),
    }
}

/// 사용자 생성 시 배정할 대학 결정.
///
/// 관리자와 슈퍼관리자만 사용자를 배정할 수 있습니다. 슈퍼관리자는
/// 대학을 반드시 지정해야 하고, 관리자는 자신의 대학에만 배정합니다.
pub fn assignment_college(claims: &Claims, requested: Option<Uuid>) -> AuthResult<Uuid> {
    match claims.role {
        Role::SuperAdmin => requested.ok_or(AuthError::MissingCollege),
        Role::Admin => {
            let own = claims.college_id.ok_or(AuthError::Forbidden)?;
            match requested {
                Some(college) if college != own => Err(AuthError::Forbidden),
                _ => Ok(own),
            }
        }
        Role::Moderator | Role::Student => Err(AuthError::Forbidden),
    }
}
