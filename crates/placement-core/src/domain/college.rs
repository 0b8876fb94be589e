//! 대학 (테넌트).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 대학 운영 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollegeStatus {
    Active,
    Inactive,
}

impl CollegeStatus {
    /// 문자열에서 상태 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(CollegeStatus::Active),
            "inactive" => Some(CollegeStatus::Inactive),
            _ => None,
        }
    }
}

/// 대학.
///
/// 테넌트 격리 단위입니다. 슈퍼관리자가 아닌 계정과 그 계정이 접근하는
/// 리소스는 모두 정확히 하나의 대학에 속합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct College {
    pub id: Uuid,
    pub name: String,
    /// 대학 코드 (대문자)
    pub code: String,
    pub status: CollegeStatus,
}

impl College {
    /// 새 활성 대학 생성.
    pub fn new(name: impl Into<String>, code: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.trim().to_uppercase(),
            status: CollegeStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CollegeStatus::Active
    }
}
