//! 사용자 역할.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 슈퍼관리자를 제외한 모든 역할은 하나의 대학에 소속됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 학생 - 자신의 대학 데이터만 조회
    Student,
    /// 모더레이터 - 대학 내 학생 관리
    Moderator,
    /// 대학 관리자 - 대학 내 사용자 관리
    Admin,
    /// 슈퍼관리자 - 모든 대학 접근 가능
    SuperAdmin,
}

impl Role {
    /// 모든 역할.
    pub const ALL: [Role; 4] = [Role::Student, Role::Moderator, Role::Admin, Role::SuperAdmin];

    /// 대학 소속이 필요한 역할인지 확인.
    pub fn requires_college(&self) -> bool {
        !matches!(self, Role::SuperAdmin)
    }

    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(Role::Student),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            "superadmin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// 저장용 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
