//! College Repository
//!
//! 대학(테넌트) 관련 데이터베이스 연산을 담당합니다.

use placement_core::{College, CollegeStatus, StoreError};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// 대학 레코드
#[derive(Debug, Clone, FromRow)]
pub struct CollegeRecord {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub status: String,
}

impl TryFrom<CollegeRecord> for College {
    type Error = StoreError;

    fn try_from(record: CollegeRecord) -> Result<Self, Self::Error> {
        let status = CollegeStatus::parse(&record.status).ok_or_else(|| {
            StoreError::Database(format!(
                "unknown status '{}' for college {}",
                record.status, record.id
            ))
        })?;

        Ok(College {
            id: record.id,
            name: record.name,
            code: record.code,
            status,
        })
    }
}

/// College Repository
pub struct CollegeRepository;

impl CollegeRepository {
    /// ID로 대학 조회
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<CollegeRecord>, sqlx::Error> {
        sqlx::query_as::<_, CollegeRecord>(
            "SELECT id, name, code, status FROM colleges WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// 전체 대학 목록 (이름순)
    pub async fn list(pool: &PgPool) -> Result<Vec<CollegeRecord>, sqlx::Error> {
        sqlx::query_as::<_, CollegeRecord>(
            "SELECT id, name, code, status FROM colleges ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }
}
