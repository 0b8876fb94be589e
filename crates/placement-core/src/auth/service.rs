//! 인증 서비스.
//!
//! 자격증명 검증, 소속 대학 상태 확인, 토큰 발급, 비밀번호 변경/재설정을
//! 하나의 진입점으로 묶습니다. HTTP 계층은 이 서비스만 호출합니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::password::{hash_password_blocking, validate_password_strength};
use super::reset::{generate_reset_token, hash_reset_token};
use super::token::{IssuedToken, TokenIssuer};
use super::verifier::CredentialVerifier;
use crate::domain::{
    normalize_identifier, Account, AccountProfile, AccountStore, CollegeStore, LockoutPolicy,
    ResetTicket, Role,
};
use crate::error::{AuthError, AuthResult, StoreError};

/// 로그인 결과.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    #[serde(flatten)]
    pub token: IssuedToken,
    pub account: AccountProfile,
}

/// 인증 서비스.
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    colleges: Arc<dyn CollegeStore>,
    verifier: CredentialVerifier,
    issuer: Arc<TokenIssuer>,
    reset_ttl: Duration,
}

impl AuthService {
    /// 새 인증 서비스 생성.
    ///
    /// # Arguments
    ///
    /// * `accounts` - 계정 저장소
    /// * `colleges` - 대학 저장소
    /// * `issuer` - 토큰 발급자
    /// * `policy` - 로그인 실패 잠금 정책
    /// * `reset_ttl` - 비밀번호 재설정 토큰 유효 기간
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        colleges: Arc<dyn CollegeStore>,
        issuer: Arc<TokenIssuer>,
        policy: LockoutPolicy,
        reset_ttl: Duration,
    ) -> AuthResult<Self> {
        let verifier = CredentialVerifier::new(accounts.clone(), policy)?;
        Ok(Self {
            accounts,
            colleges,
            verifier,
            issuer,
            reset_ttl,
        })
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    // =========================================================================
    // 로그인
    // =========================================================================

    /// 로그인.
    ///
    /// 자격증명을 검증한 뒤, 슈퍼관리자가 아니면 소속 대학이 활성 상태인지
    /// 확인하고 토큰을 발급합니다.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<LoginOutcome> {
        self.login_at(username, password, Utc::now()).await
    }

    /// 지정한 시각 기준으로 로그인.
    pub async fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<LoginOutcome> {
        let verified = self.verifier.verify_at(username, password, now).await?;
        let account = verified.account;

        if account.role != Role::SuperAdmin {
            self.ensure_college_active(&account).await?;
        }

        let token = self.issuer.issue_at(&account, now)?;
        info!(
            account_id = %account.id,
            role = %account.role,
            "Login succeeded"
        );

        Ok(LoginOutcome {
            token,
            account: account.profile(),
        })
    }

    async fn ensure_college_active(&self, account: &Account) -> AuthResult<()> {
        let college_id = account.college_id.ok_or(AuthError::CollegeInactive)?;
        match self.colleges.find_college(college_id).await? {
            Some(college) if college.is_active() => Ok(()),
            _ => {
                info!(account_id = %account.id, %college_id, "Login rejected for inactive college");
                Err(AuthError::CollegeInactive)
            }
        }
    }

    /// 계정 프로필 조회.
    pub async fn profile(&self, account_id: Uuid) -> AuthResult<AccountProfile> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .filter(|account| account.active)
            .map(|account| account.profile())
            .ok_or(AuthError::NotFound)
    }

    // =========================================================================
    // 비밀번호 변경/재설정
    // =========================================================================

    /// 비밀번호 변경.
    ///
    /// 현재 비밀번호가 일치해야 하며 새 비밀번호는 강도 요구사항을
    /// 충족해야 합니다. 현재 비밀번호 확인은 로그인과 같은 잠금 규칙을
    /// 따르므로 잠긴 계정은 변경할 수 없습니다.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        self.change_password_at(account_id, current_password, new_password, Utc::now())
            .await
    }

    /// 지정한 시각 기준으로 비밀번호 변경.
    ///
    /// # Errors
    ///
    /// - `AuthError::WeakPassword`: 새 비밀번호 강도 미달 (실패로 기록하지 않음)
    /// - `AuthError::AccountLocked`: 잠금 기간 중
    /// - `AuthError::InvalidCredentials`: 현재 비밀번호 불일치 (실패 횟수 기록 후)
    pub async fn change_password_at(
        &self,
        account_id: Uuid,
        current_password: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .filter(|account| account.active)
            .ok_or(AuthError::NotFound)?;

        validate_password_strength(new_password).map_err(AuthError::WeakPassword)?;

        let account = self
            .verifier
            .check_password_at(account, current_password, now)
            .await?;

        let hash = hash_password_blocking(new_password).await?;
        self.accounts.update_password_hash(account.id, &hash).await?;

        info!(account_id = %account.id, "Password changed");
        Ok(())
    }

    /// 비밀번호 재설정 요청.
    ///
    /// 사용자 이름과 이메일이 일치하는 활성 계정에 재설정 토큰을 발급하고
    /// 원본 토큰을 반환합니다. 전달(이메일 발송 등)은 호출자 책임입니다.
    ///
    /// # Errors
    ///
    /// - `AuthError::NotFound`: 일치하는 계정 없음. HTTP 계층은 성공과 같은
    ///   응답을 돌려줘야 합니다.
    pub async fn request_password_reset(&self, username: &str, email: &str) -> AuthResult<String> {
        let username = normalize_identifier(username);
        let email = normalize_identifier(email);

        let account = self
            .accounts
            .find_by_username(&username)
            .await?
            .filter(|account| account.active && account.email == email)
            .ok_or(AuthError::NotFound)?;

        let (raw, token_hash) = generate_reset_token();
        let ticket = ResetTicket {
            token_hash,
            expires_at: Utc::now() + self.reset_ttl,
        };
        self.accounts.set_reset_token(account.id, &ticket).await?;

        info!(account_id = %account.id, expires_at = %ticket.expires_at, "Password reset requested");
        Ok(raw)
    }

    /// 재설정 토큰으로 비밀번호 재설정.
    pub async fn reset_password(&self, raw_token: &str, new_password: &str) -> AuthResult<()> {
        self.reset_password_at(raw_token, new_password, Utc::now())
            .await
    }

    /// 지정한 시각 기준으로 비밀번호 재설정.
    ///
    /// 토큰 확인과 소비는 저장소의 조건부 갱신 한 번으로 이뤄지므로 같은
    /// 토큰으로 동시에 요청해도 하나만 성공합니다. 성공하면 재설정 토큰과
    /// 잠금 상태가 함께 초기화됩니다.
    pub async fn reset_password_at(
        &self,
        raw_token: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        validate_password_strength(new_password).map_err(AuthError::WeakPassword)?;

        let token_hash = hash_reset_token(raw_token);
        let account = self
            .accounts
            .find_by_reset_token(&token_hash, now)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        if !account.active {
            info!(account_id = %account.id, "Password reset rejected for inactive account");
            return Err(AuthError::InvalidResetToken);
        }

        let hash = hash_password_blocking(new_password).await?;
        if !self
            .accounts
            .consume_reset_token(account.id, &token_hash, now, &hash)
            .await?
        {
            debug!(account_id = %account.id, "Reset token consumed concurrently");
            return Err(AuthError::InvalidResetToken);
        }

        info!(account_id = %account.id, "Password reset completed");
        Ok(())
    }

    // =========================================================================
    // 초기화
    // =========================================================================

    /// 최초 슈퍼관리자 생성.
    ///
    /// 같은 사용자 이름의 계정이 이미 있으면 아무것도 하지 않습니다.
    ///
    /// # Returns
    ///
    /// 새 계정을 만들었으면 `true`
    pub async fn bootstrap_superadmin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<bool> {
        let username = normalize_identifier(username);
        if self.accounts.find_by_username(&username).await?.is_some() {
            return Ok(false);
        }

        validate_password_strength(password).map_err(AuthError::WeakPassword)?;
        let hash = hash_password_blocking(password).await?;
        let account = Account::new(&username, email, hash, Role::SuperAdmin, None)?;

        match self.accounts.insert_account(&account).await {
            Ok(()) => {
                info!(account_id = %account.id, username = %account.username, "Superadmin created");
                Ok(true)
            }
            Err(StoreError::Duplicate(_)) => {
                warn!(username = %account.username, "Superadmin created concurrently");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
