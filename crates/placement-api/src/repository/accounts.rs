//! Account Repository
//!
//! 계정 관련 데이터베이스 연산을 담당합니다.

use chrono::{DateTime, Utc};
use placement_core::{Account, LockState, ResetTicket, Role, StoreError};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

// ================================================================================================
// Types
// ================================================================================================

/// 계정 레코드
#[derive(Debug, Clone, FromRow)]
pub struct AccountRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    #[sqlx(default)]
    pub college_id: Option<Uuid>,
    pub active: bool,
    pub failed_attempts: i32,
    #[sqlx(default)]
    pub locked_until: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub reset_token_hash: Option<String>,
    #[sqlx(default)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = StoreError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let role = Role::parse(&record.role).ok_or_else(|| {
            StoreError::Database(format!("unknown role '{}' for account {}", record.role, record.id))
        })?;
        let failed_attempts = u32::try_from(record.failed_attempts).map_err(|_| {
            StoreError::Database(format!("negative failed_attempts for account {}", record.id))
        })?;

        let reset = match (record.reset_token_hash, record.reset_token_expires_at) {
            (Some(token_hash), Some(expires_at)) => Some(ResetTicket {
                token_hash,
                expires_at,
            }),
            _ => None,
        };

        Ok(Account {
            id: record.id,
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            role,
            college_id: record.college_id,
            active: record.active,
            lock: LockState {
                failed_attempts,
                locked_until: record.locked_until,
            },
            last_login_at: record.last_login_at,
            reset,
            created_at: record.created_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = r#"
    id, username, email, password_hash, role, college_id, active,
    failed_attempts, locked_until, last_login_at,
    reset_token_hash, reset_token_expires_at, created_at
"#;

// ================================================================================================
// Repository
// ================================================================================================

/// Account Repository
pub struct AccountRepository;

impl AccountRepository {
    /// ID로 계정 조회
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AccountRecord>, sqlx::Error> {
        let query = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, AccountRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 사용자 이름으로 계정 조회
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<AccountRecord>, sqlx::Error> {
        let query = format!("SELECT {} FROM accounts WHERE username = $1", ACCOUNT_COLUMNS);
        sqlx::query_as::<_, AccountRecord>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// 만료되지 않은 재설정 토큰으로 계정 조회
    pub async fn find_by_reset_token(
        pool: &PgPool,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccountRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM accounts WHERE reset_token_hash = $1 AND reset_token_expires_at > $2",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRecord>(&query)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// 잠금 상태 조건부 갱신
    ///
    /// 저장된 `(failed_attempts, locked_until)`이 `expected`와 같을 때만
    /// 갱신합니다. 갱신되었으면 `true`.
    pub async fn compare_and_set_lock(
        pool: &PgPool,
        id: Uuid,
        expected: LockState,
        next: LockState,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET failed_attempts = $4, locked_until = $5
            WHERE id = $1
              AND failed_attempts = $2
              AND locked_until IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(id)
        .bind(lock_count(expected.failed_attempts))
        .bind(expected.locked_until)
        .bind(lock_count(next.failed_attempts))
        .bind(next.locked_until)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 마지막 로그인 시각 기록
    pub async fn record_login(
        pool: &PgPool,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE accounts SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// 비밀번호 해시 교체 (발급된 재설정 토큰 폐기)
    pub async fn update_password_hash(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 재설정 토큰 소비
    ///
    /// 활성 계정의 토큰이 일치하고 만료되지 않았을 때만 비밀번호를 교체하고 토큰과
    /// 잠금 상태를 초기화합니다. 소비되었으면 `true`.
    pub async fn consume_reset_token(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
        now: DateTime<Utc>,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $4,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                failed_attempts = 0,
                locked_until = NULL
            WHERE id = $1
              AND active
              AND reset_token_hash = $2
              AND reset_token_expires_at > $3
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(now)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 재설정 토큰 저장
    pub async fn set_reset_token(
        pool: &PgPool,
        id: Uuid,
        ticket: &ResetTicket,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET reset_token_hash = $2, reset_token_expires_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&ticket.token_hash)
        .bind(ticket.expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 계정 생성
    pub async fn insert(pool: &PgPool, account: &Account) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, email, password_hash, role, college_id, active,
                failed_attempts, locked_until, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.college_id)
        .bind(account.active)
        .bind(lock_count(account.lock.failed_attempts))
        .bind(account.lock.locked_until)
        .bind(account.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }
}

fn lock_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(role: &str, failed_attempts: i32) -> AccountRecord {
        AccountRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@tu1.edu".to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            college_id: Some(Uuid::new_v4()),
            active: true,
            failed_attempts,
            locked_until: None,
            last_login_at: None,
            reset_token_hash: Some("digest".to_string()),
            reset_token_expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_into_account() {
        let account = Account::try_from(record("moderator", 2)).unwrap();
        assert_eq!(account.role, Role::Moderator);
        assert_eq!(account.lock.failed_attempts, 2);
        // 만료 시각 없는 토큰은 무시
        assert!(account.reset.is_none());
    }

    #[test]
    fn test_invalid_record_rejected() {
        assert!(Account::try_from(record("recruiter", 0)).is_err());
        assert!(Account::try_from(record("student", -1)).is_err());
    }
}
