//! 인메모리 계정/대학 저장소.
//!
//! 데이터베이스 없이 개발 서버를 띄우거나 테스트할 때 사용합니다.
//! 모든 갱신은 단일 쓰기 락 안에서 이뤄지므로 조건부 갱신이 원자적입니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Account, AccountStore, College, CollegeStore, LockState, ResetTicket};
use crate::error::StoreError;

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    /// username -> account id
    usernames: HashMap<String, Uuid>,
    colleges: HashMap<Uuid, College>,
}

/// 인메모리 저장소.
///
/// 복제본은 같은 데이터를 공유합니다.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 대학 추가 (같은 ID면 대체).
    pub async fn insert_college(&self, college: College) {
        self.inner
            .write()
            .await
            .colleges
            .insert(college.id, college);
    }

    /// 저장된 계정 수.
    pub async fn account_count(&self) -> usize {
        self.inner.read().await.accounts.len()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .usernames
            .get(username)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn update_lock_state(
        &self,
        id: Uuid,
        expected: LockState,
        next: LockState,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.accounts.get_mut(&id) {
            Some(account) if account.lock == expected => {
                account.lock = next;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::Database(format!("account {} not found", id))),
        }
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(account) = self.inner.write().await.accounts.get_mut(&id) {
            account.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::Database(format!("account {} not found", id)))?;

        account.password_hash = password_hash.to_string();
        account.reset = None;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(account) = inner.accounts.get_mut(&id) else {
            return Ok(false);
        };

        let valid = account.active
            && matches!(
                &account.reset,
                Some(ticket) if ticket.token_hash == token_hash && ticket.expires_at > now
            );
        if !valid {
            return Ok(false);
        }

        account.password_hash = password_hash.to_string();
        account.reset = None;
        account.lock = LockState::default();
        Ok(true)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.usernames.contains_key(&account.username) {
            return Err(StoreError::Duplicate(account.username.clone()));
        }

        inner
            .usernames
            .insert(account.username.clone(), account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn set_reset_token(&self, id: Uuid, ticket: &ResetTicket) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::Database(format!("account {} not found", id)))?;

        account.reset = Some(ticket.clone());
        Ok(())
    }

    async fn find_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .values()
            .find(|account| {
                matches!(
                    &account.reset,
                    Some(ticket) if ticket.token_hash == token_hash && ticket.expires_at > now
                )
            })
            .cloned())
    }
}

#[async_trait]
impl CollegeStore for MemoryStore {
    async fn find_college(&self, id: Uuid) -> Result<Option<College>, StoreError> {
        Ok(self.inner.read().await.colleges.get(&id).cloned())
    }

    async fn list_colleges(&self) -> Result<Vec<College>, StoreError> {
        let mut colleges: Vec<College> =
            self.inner.read().await.colleges.values().cloned().collect();
        colleges.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(colleges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::Duration;

    fn student(college: Uuid) -> Account {
        Account::new("alice", "alice@tu1.edu", "hash".into(), Role::Student, Some(college)).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryStore::new();
        let account = student(Uuid::new_v4());
        store.insert_account(&account).await.unwrap();

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryStore::new();
        let college = Uuid::new_v4();
        store.insert_account(&student(college)).await.unwrap();

        let result = store.insert_account(&student(college)).await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_lock_state_compare_and_swap() {
        let store = MemoryStore::new();
        let account = student(Uuid::new_v4());
        store.insert_account(&account).await.unwrap();

        let next = LockState {
            failed_attempts: 1,
            locked_until: None,
        };
        assert!(store
            .update_lock_state(account.id, LockState::default(), next)
            .await
            .unwrap());

        // 오래된 expected 값으로는 갱신되지 않음
        assert!(!store
            .update_lock_state(account.id, LockState::default(), next)
            .await
            .unwrap());

        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.lock, next);
    }

    #[tokio::test]
    async fn test_reset_token_expiry() {
        let store = MemoryStore::new();
        let account = student(Uuid::new_v4());
        store.insert_account(&account).await.unwrap();

        let now = Utc::now();
        let ticket = ResetTicket {
            token_hash: "abc".to_string(),
            expires_at: now + Duration::minutes(60),
        };
        store.set_reset_token(account.id, &ticket).await.unwrap();

        assert!(store.find_by_reset_token("abc", now).await.unwrap().is_some());
        assert!(store
            .find_by_reset_token("abc", now + Duration::minutes(61))
            .await
            .unwrap()
            .is_none());
        assert!(store.find_by_reset_token("other", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_update_keeps_lock_state() {
        let store = MemoryStore::new();
        let account = student(Uuid::new_v4());
        store.insert_account(&account).await.unwrap();

        let failing = LockState {
            failed_attempts: 2,
            locked_until: None,
        };
        store
            .update_lock_state(account.id, LockState::default(), failing)
            .await
            .unwrap();
        store.update_password_hash(account.id, "new-hash").await.unwrap();

        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        assert_eq!(stored.lock, failing);
    }

    #[tokio::test]
    async fn test_consume_reset_token_clears_reset_and_lock() {
        let store = MemoryStore::new();
        let account = student(Uuid::new_v4());
        store.insert_account(&account).await.unwrap();

        let locked = LockState {
            failed_attempts: 5,
            locked_until: Some(Utc::now() + Duration::minutes(15)),
        };
        store
            .update_lock_state(account.id, LockState::default(), locked)
            .await
            .unwrap();
        store
            .set_reset_token(
                account.id,
                &ResetTicket {
                    token_hash: "abc".into(),
                    expires_at: Utc::now() + Duration::minutes(60),
                },
            )
            .await
            .unwrap();

        let now = Utc::now();
        assert!(!store
            .consume_reset_token(account.id, "other", now, "bad-hash")
            .await
            .unwrap());
        assert!(store
            .consume_reset_token(account.id, "abc", now, "new-hash")
            .await
            .unwrap());
        // 두 번째 소비는 실패
        assert!(!store
            .consume_reset_token(account.id, "abc", now, "third-hash")
            .await
            .unwrap());

        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        assert_eq!(stored.lock, LockState::default());
        assert!(stored.reset.is_none());
    }

    #[tokio::test]
    async fn test_consume_expired_reset_token() {
        let store = MemoryStore::new();
        let account = student(Uuid::new_v4());
        store.insert_account(&account).await.unwrap();

        let now = Utc::now();
        store
            .set_reset_token(
                account.id,
                &ResetTicket {
                    token_hash: "abc".into(),
                    expires_at: now,
                },
            )
            .await
            .unwrap();

        assert!(!store
            .consume_reset_token(account.id, "abc", now, "new-hash")
            .await
            .unwrap());
        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_colleges_sorted_by_name() {
        let store = MemoryStore::new();
        store.insert_college(College::new("Zeta College", "ZC")).await;
        store.insert_college(College::new("Alpha College", "AC")).await;

        let colleges = store.list_colleges().await.unwrap();
        let names: Vec<_> = colleges.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha College", "Zeta College"]);
    }
}
