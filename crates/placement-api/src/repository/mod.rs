//! Repository pattern for database operations.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.
//! 모든 Repository는 static methods 패턴을 사용하며, [`PgStore`]가 이를
//! 코어의 저장소 trait에 연결합니다.

pub mod accounts;
pub mod colleges;
mod store;

pub use accounts::{AccountRecord, AccountRepository};
pub use colleges::{CollegeRecord, CollegeRepository};
pub use store::{run_migrations, PgStore};

use placement_core::StoreError;

/// sqlx 에러를 저장소 에러로 변환.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::Duplicate(db.message().to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}
