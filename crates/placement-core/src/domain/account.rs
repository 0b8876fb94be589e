//! 계정 및 잠금 상태.
//!
//! 계정은 물리적으로 삭제되지 않으며 `active` 플래그로 비활성화됩니다.
//! 실패 횟수와 잠금 해제 시각은 [`LockState`] 하나의 값으로 다뤄지며,
//! 저장소는 이 값을 조건부 갱신(compare-and-swap)으로만 변경합니다.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;
use crate::error::{AuthError, AuthResult};

/// 로그인 실패 잠금 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// 잠금까지 허용되는 연속 실패 횟수
    pub max_failed_attempts: u32,
    /// 잠금 유지 시간
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout: Duration::minutes(15),
        }
    }
}

/// 실패 횟수와 잠금 해제 시각.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockState {
    /// 연속 로그인 실패 횟수
    pub failed_attempts: u32,
    /// 잠금 해제 시각
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockState {
    /// 주어진 시각에 잠겨 있는지 확인.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }

    /// 만료된 잠금을 해제한 상태를 반환.
    ///
    /// 잠금 시각이 지났으면 실패 횟수도 0으로 돌아갑니다.
    pub fn expire_at(self, now: DateTime<Utc>) -> Self {
        match self.locked_until {
            Some(until) if until <= now => Self::default(),
            _ => self,
        }
    }

    /// 실패 한 번을 반영한 다음 상태.
    pub fn after_failure(self, policy: &LockoutPolicy, now: DateTime<Utc>) -> Self {
        let failed_attempts = self.failed_attempts.saturating_add(1);
        let locked_until = if failed_attempts >= policy.max_failed_attempts {
            Some(now + policy.lockout)
        } else {
            self.locked_until
        };

        Self {
            failed_attempts,
            locked_until,
        }
    }
}

/// 비밀번호 재설정 티켓.
///
/// 원본 토큰은 저장하지 않고 SHA-256 다이제스트만 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTicket {
    /// 재설정 토큰의 SHA-256 hex 다이제스트
    pub token_hash: String,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// 사용자 계정.
#[derive(Clone)]
pub struct Account {
    pub id: Uuid,
    /// 소문자로 정규화된 사용자 이름
    pub username: String,
    /// 소문자로 정규화된 이메일
    pub email: String,
    /// Argon2 PHC 해시
    pub password_hash: String,
    pub role: Role,
    /// 소속 대학 (슈퍼관리자만 `None`)
    pub college_id: Option<Uuid>,
    pub active: bool,
    pub lock: LockState,
    pub last_login_at: Option<DateTime<Utc>>,
    pub reset: Option<ResetTicket>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// 새 활성 계정 생성.
    ///
    /// 슈퍼관리자가 아닌 역할은 반드시 대학에 소속되어야 합니다.
    pub fn new(
        username: &str,
        email: &str,
        password_hash: String,
        role: Role,
        college_id: Option<Uuid>,
    ) -> AuthResult<Self> {
        if role.requires_college() && college_id.is_none() {
            return Err(AuthError::MissingCollege);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            username: normalize_identifier(username),
            email: normalize_identifier(email),
            password_hash,
            role,
            college_id: if role.requires_college() { college_id } else { None },
            active: true,
            lock: LockState::default(),
            last_login_at: None,
            reset: None,
            created_at: Utc::now(),
        })
    }

    /// 외부에 노출 가능한 프로필.
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            college_id: self.college_id,
            last_login_at: self.last_login_at,
        }
    }
}

// 비밀번호 해시와 재설정 토큰은 로그에 남기지 않는다.
impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("college_id", &self.college_id)
            .field("active", &self.active)
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}

/// 계정 공개 프로필.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub college_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// 사용자 이름/이메일 정규화 (앞뒤 공백 제거, 소문자).
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LockoutPolicy {
        LockoutPolicy {
            max_failed_attempts: 3,
            lockout: Duration::minutes(10),
        }
    }

    #[test]
    fn test_failure_locks_at_threshold() {
        let now = Utc::now();
        let state = LockState::default()
            .after_failure(&policy(), now)
            .after_failure(&policy(), now);
        assert_eq!(state.failed_attempts, 2);
        assert!(!state.is_locked_at(now));

        let state = state.after_failure(&policy(), now);
        assert_eq!(state.failed_attempts, 3);
        assert_eq!(state.locked_until, Some(now + Duration::minutes(10)));
        assert!(state.is_locked_at(now));
    }

    #[test]
    fn test_expired_lock_resets_counter() {
        let now = Utc::now();
        let locked = LockState {
            failed_attempts: 3,
            locked_until: Some(now - Duration::seconds(1)),
        };
        assert!(!locked.is_locked_at(now));
        assert_eq!(locked.expire_at(now), LockState::default());

        let active = LockState {
            failed_attempts: 3,
            locked_until: Some(now + Duration::seconds(1)),
        };
        assert_eq!(active.expire_at(now), active);
    }

    #[test]
    fn test_lock_boundary_is_exclusive() {
        let now = Utc::now();
        let state = LockState {
            failed_attempts: 5,
            locked_until: Some(now),
        };
        assert!(!state.is_locked_at(now));
    }

    #[test]
    fn test_non_superadmin_requires_college() {
        let result = Account::new("alice", "alice@x.edu", "hash".into(), Role::Student, None);
        assert!(matches!(result, Err(AuthError::MissingCollege)));

        let admin = Account::new("root", "root@x.edu", "hash".into(), Role::SuperAdmin, None);
        assert!(admin.is_ok());
    }

    #[test]
    fn test_superadmin_drops_college() {
        let account = Account::new(
            "Root",
            "Root@X.edu",
            "hash".into(),
            Role::SuperAdmin,
            Some(Uuid::new_v4()),
        )
        .unwrap();
        assert_eq!(account.college_id, None);
        assert_eq!(account.username, "root");
        assert_eq!(account.email, "root@x.edu");
    }

    #[test]
    fn test_debug_hides_password_hash() {
        let account = Account::new(
            "bob",
            "bob@x.edu",
            "$argon2id$secret".into(),
            Role::Admin,
            Some(Uuid::new_v4()),
        )
        .unwrap();
        let debug = format!("{:?}", account);
        assert!(!debug.contains("argon2id"));
        assert!(debug.contains("bob"));
    }
}
