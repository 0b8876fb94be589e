//! 계정/대학 저장소 추상화.
//!
//! 접근 제어 코어는 영속 저장소를 직접 구현하지 않고 이 trait들을 통해
//! 사용합니다. PostgreSQL 구현은 API 크레이트에, 인메모리 구현은
//! [`crate::store::MemoryStore`]에 있습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Account, College, LockState, ResetTicket};
use crate::error::StoreError;

// =============================================================================
// AccountStore Trait
// =============================================================================

/// 계정 저장소 trait.
///
/// # 동시성
///
/// 같은 계정에 대한 로그인 시도는 [`AccountStore::update_lock_state`]의
/// 조건부 갱신으로 직렬화됩니다. 구현체는 `expected`가 현재 저장된 값과
/// 정확히 일치할 때만 `next`를 기록해야 하며, 이 비교와 기록은 원자적이어야
/// 합니다.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// ID로 계정 조회.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// 사용자 이름으로 계정 조회.
    ///
    /// `username`은 호출자가 이미 소문자로 정규화한 값입니다.
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// 잠금 상태 조건부 갱신.
    ///
    /// # Returns
    ///
    /// 저장된 상태가 `expected`와 같아 `next`가 기록되었으면 `true`,
    /// 다른 요청이 먼저 갱신했으면 `false`.
    async fn update_lock_state(
        &self,
        id: Uuid,
        expected: LockState,
        next: LockState,
    ) -> Result<bool, StoreError>;

    /// 마지막 로그인 시각 기록.
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// 비밀번호 해시 교체.
    ///
    /// 발급된 재설정 티켓은 함께 폐기합니다. 잠금 상태는 건드리지 않습니다.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    /// 재설정 티켓을 소비하면서 비밀번호 해시 교체.
    ///
    /// 활성 계정에 저장된 티켓의 해시가 `token_hash`와 같고 `now` 기준으로
    /// 만료되지 않았을 때만 해시를 기록하고 티켓과 잠금 상태를 초기화합니다.
    /// 확인과 기록은 원자적이어야 하며, 같은 티켓으로는 한 번만 성공합니다.
    ///
    /// # Returns
    ///
    /// 티켓이 소비되었으면 `true`, 이미 사용되었거나 만료/교체되었으면 `false`.
    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, StoreError>;

    /// 새 계정 저장.
    ///
    /// # Errors
    ///
    /// - `StoreError::Duplicate`: 같은 사용자 이름이 이미 존재
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// 비밀번호 재설정 티켓 저장 (기존 티켓 대체).
    async fn set_reset_token(&self, id: Uuid, ticket: &ResetTicket) -> Result<(), StoreError>;

    /// 만료되지 않은 재설정 티켓으로 계정 조회.
    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError>;
}

// =============================================================================
// CollegeStore Trait
// =============================================================================

/// 대학 저장소 trait.
#[async_trait]
pub trait CollegeStore: Send + Sync {
    /// ID로 대학 조회.
    async fn find_college(&self, id: Uuid) -> Result<Option<College>, StoreError>;

    /// 전체 대학 목록 (이름순).
    async fn list_colleges(&self) -> Result<Vec<College>, StoreError>;
}
