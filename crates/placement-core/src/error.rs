//! 인증/인가 에러 타입.
//!
//! 자격증명 검증, 토큰 검증, 권한 게이트, 저장소 접근에서 발생하는
//! 에러를 정의합니다. 모든 에러는 호출자가 복구 가능하며 HTTP 계층에서
//! 상태 코드로 변환됩니다.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::PasswordError;

/// 계정 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 데이터베이스 연결/쿼리 실패
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 조건부 갱신이 반복적으로 충돌함
    #[error("동시 갱신 충돌: {0}")]
    Conflict(String),

    /// 고유 키 중복
    #[error("이미 존재하는 레코드: {0}")]
    Duplicate(String),
}

/// 인증/인가 에러.
#[derive(Debug, Error)]
pub enum AuthError {
    /// 사용자 이름에 해당하는 계정 없음
    #[error("아이디 또는 비밀번호가 올바르지 않습니다")]
    NotFound,

    /// 비밀번호 불일치
    #[error("아이디 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,

    /// 반복된 실패로 계정 잠김
    #[error("계정이 잠겨 있습니다 (해제 시각: {until})")]
    AccountLocked { until: DateTime<Utc> },

    /// 토큰 만료
    #[error("토큰이 만료되었습니다")]
    Expired,

    /// 서명 또는 구조가 잘못된 토큰
    #[error("유효하지 않은 토큰")]
    Malformed,

    /// 역할 또는 소속 대학 불일치
    #[error("접근 권한이 없습니다")]
    Forbidden,

    /// 비활성화된 계정
    #[error("비활성화된 계정입니다")]
    AccountInactive,

    /// 소속 대학이 없거나 비활성 상태
    #[error("소속 대학이 비활성 상태입니다")]
    CollegeInactive,

    /// 대학 지정이 필요한 요청에 대학이 없음
    #[error("대학을 지정해야 합니다")]
    MissingCollege,

    /// 비밀번호 강도 미달
    #[error("비밀번호 요구사항 미충족: {0}")]
    WeakPassword(&'static str),

    /// 알 수 없거나 만료된 재설정 토큰
    #[error("유효하지 않거나 만료된 재설정 토큰")]
    InvalidResetToken,

    /// 토큰 서명 실패
    #[error("토큰 서명 실패: {0}")]
    Token(String),

    /// 비밀번호 해싱 실패
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// 저장소 에러 (일시적)
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 인증 작업을 위한 Result 타입.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_message() {
        assert_eq!(
            AuthError::NotFound.to_string(),
            AuthError::InvalidCredentials.to_string()
        );
    }

    #[test]
    fn test_store_error_converts() {
        let err: AuthError = StoreError::Conflict("lock state".to_string()).into();
        assert!(matches!(err, AuthError::Store(StoreError::Conflict(_))));
    }
}
