//! 자격증명 검증기.
//!
//! 사용자 이름/비밀번호를 확인하고 연속 실패에 따른 계정 잠금을
//! 관리합니다.
//!
//! # 동시성
//!
//! 잠금 상태 변경은 [`AccountStore::update_lock_state`]의 조건부 갱신으로만
//! 이뤄집니다. 다른 요청이 먼저 상태를 바꿨으면 계정을 다시 읽고 처음부터
//! 판단합니다. 재시도를 모두 소진하면 접근을 거부합니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::password::{hash_password, verify_password_blocking};
use crate::domain::{normalize_identifier, Account, AccountStore, LockState, LockoutPolicy};
use crate::error::{AuthError, AuthResult, StoreError};

/// 조건부 갱신 최대 시도 횟수.
const MAX_CAS_RETRIES: usize = 8;

/// 검증 성공 결과.
#[derive(Debug, Clone)]
pub struct Verified {
    /// 갱신된 잠금 상태와 로그인 시각이 반영된 계정
    pub account: Account,
    /// 검증 시각
    pub verified_at: DateTime<Utc>,
}

/// 자격증명 검증기.
pub struct CredentialVerifier {
    store: Arc<dyn AccountStore>,
    policy: LockoutPolicy,
    /// 존재하지 않는 사용자에 대해 동일한 비용을 치르기 위한 해시
    dummy_hash: String,
}

impl CredentialVerifier {
    /// 새 검증기 생성.
    pub fn new(store: Arc<dyn AccountStore>, policy: LockoutPolicy) -> AuthResult<Self> {
        let dummy_hash = hash_password("placement-timing-equalizer")?;
        Ok(Self {
            store,
            policy,
            dummy_hash,
        })
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// 자격증명 검증.
    pub async fn verify(&self, username: &str, password: &str) -> AuthResult<Verified> {
        self.verify_at(username, password, Utc::now()).await
    }

    /// 지정한 시각 기준으로 자격증명 검증.
    ///
    /// # Errors
    ///
    /// - `AuthError::NotFound`: 사용자 없음
    /// - `AuthError::AccountLocked`: 잠금 기간 중 (비밀번호 일치 여부와 무관)
    /// - `AuthError::InvalidCredentials`: 비밀번호 불일치 (실패 횟수 기록 후)
    /// - `AuthError::AccountInactive`: 비밀번호는 맞지만 비활성 계정
    /// - `AuthError::Store`: 저장소 장애 또는 갱신 충돌 재시도 소진
    pub async fn verify_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Verified> {
        let username = normalize_identifier(username);

        let Some(account) = self.store.find_by_username(&username).await? else {
            // 존재 여부가 응답 시간으로 드러나지 않도록 검증 비용을 동일하게 지불
            let _ = verify_password_blocking(password, &self.dummy_hash).await;
            debug!(username = %username, "Login attempt for unknown account");
            return Err(AuthError::NotFound);
        };

        let mut account = self.check_password_at(account, password, now).await?;

        if !account.active {
            info!(account_id = %account.id, "Login rejected for inactive account");
            return Err(AuthError::AccountInactive);
        }

        self.store.record_login(account.id, now).await?;
        account.last_login_at = Some(now);

        Ok(Verified {
            account,
            verified_at: now,
        })
    }

    /// 이미 조회한 계정의 비밀번호 확인.
    ///
    /// 로그인과 같은 잠금 규칙을 적용합니다. 잠금 기간에는 비밀번호와
    /// 무관하게 거부하고, 불일치는 실패 횟수에 기록합니다. 계정 활성 여부와
    /// 로그인 시각은 다루지 않습니다.
    ///
    /// # Returns
    ///
    /// 잠금 상태가 반영된 최신 계정
    pub async fn check_password_at(
        &self,
        mut account: Account,
        password: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Account> {
        // (해시, 일치 여부) - 재시도 중 해시가 바뀌지 않으면 재검증하지 않음
        let mut checked: Option<(String, bool)> = None;

        for attempt in 0..MAX_CAS_RETRIES {
            let current = account.lock;

            if current.is_locked_at(now) {
                if let Some(until) = current.locked_until {
                    debug!(account_id = %account.id, %until, "Password check on locked account");
                    return Err(AuthError::AccountLocked { until });
                }
            }

            let matched = match &checked {
                Some((hash, matched)) if *hash == account.password_hash => *matched,
                _ => {
                    let matched = verify_password_blocking(password, &account.password_hash).await;
                    checked = Some((account.password_hash.clone(), matched));
                    matched
                }
            };

            let next = if matched {
                LockState::default()
            } else {
                current.expire_at(now).after_failure(&self.policy, now)
            };

            // 상태가 그대로여도 조건부 갱신으로 읽은 값이 최신인지 확인
            if !self
                .store
                .update_lock_state(account.id, current, next)
                .await?
            {
                debug!(account_id = %account.id, attempt, "Lock state changed concurrently, retrying");
                account = self
                    .store
                    .find_by_id(account.id)
                    .await?
                    .ok_or(AuthError::NotFound)?;
                continue;
            }
            account.lock = next;

            if !matched {
                if next.is_locked_at(now) {
                    warn!(
                        account_id = %account.id,
                        failed_attempts = next.failed_attempts,
                        "Account locked after repeated password failures"
                    );
                }
                return Err(AuthError::InvalidCredentials);
            }

            return Ok(account);
        }

        warn!(account_id = %account.id, "Lock state update retries exhausted");
        Err(StoreError::Conflict(format!("lock state of account {}", account.id)).into())
    }
}
