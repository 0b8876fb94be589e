//! PostgreSQL 기반 계정/대학 저장소.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use placement_core::{
    Account, AccountStore, College, CollegeStore, LockState, ResetTicket, StoreError,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{store_error, AccountRepository, CollegeRepository};

/// 마이그레이션 실행.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations...");
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}

/// PostgreSQL 저장소.
///
/// 잠금 상태 조건부 갱신은 단일 `UPDATE ... WHERE` 문으로 수행되므로
/// 여러 서버 인스턴스가 같은 데이터베이스를 공유해도 원자적입니다.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn missing(id: Uuid) -> StoreError {
    StoreError::Database(format!("account {} not found", id))
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        AccountRepository::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        AccountRepository::find_by_username(&self.pool, username)
            .await
            .map_err(store_error)?
            .map(Account::try_from)
            .transpose()
    }

    async fn update_lock_state(
        &self,
        id: Uuid,
        expected: LockState,
        next: LockState,
    ) -> Result<bool, StoreError> {
        AccountRepository::compare_and_set_lock(&self.pool, id, expected, next)
            .await
            .map_err(store_error)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        AccountRepository::record_login(&self.pool, id, at)
            .await
            .map_err(store_error)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let updated = AccountRepository::update_password_hash(&self.pool, id, password_hash)
            .await
            .map_err(store_error)?;
        if updated {
            Ok(())
        } else {
            Err(missing(id))
        }
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        AccountRepository::consume_reset_token(&self.pool, id, token_hash, now, password_hash)
            .await
            .map_err(store_error)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        AccountRepository::insert(&self.pool, account)
            .await
            .map_err(store_error)
    }

    async fn set_reset_token(&self, id: Uuid, ticket: &ResetTicket) -> Result<(), StoreError> {
        let updated = AccountRepository::set_reset_token(&self.pool, id, ticket)
            .await
            .map_err(store_error)?;
        if updated {
            Ok(())
        } else {
            Err(missing(id))
        }
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        AccountRepository::find_by_reset_token(&self.pool, token_hash, now)
            .await
            .map_err(store_error)?
            .map(Account::try_from)
            .transpose()
    }
}

#[async_trait]
impl CollegeStore for PgStore {
    async fn find_college(&self, id: Uuid) -> Result<Option<College>, StoreError> {
        CollegeRepository::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?
            .map(College::try_from)
            .transpose()
    }

    async fn list_colleges(&self) -> Result<Vec<College>, StoreError> {
        CollegeRepository::list(&self.pool)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(College::try_from)
            .collect()
    }
}
