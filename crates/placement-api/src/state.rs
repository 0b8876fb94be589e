//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 모든 API 핸들러에서 공유되는 상태를 관리합니다.
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다. 모든 구성요소는
//! 서버 시작 시 명시적으로 생성되어 주입되며 전역 상태는 없습니다.

use std::sync::Arc;

use chrono::Duration;
use placement_core::{
    AccountStore, AuthResult, AuthService, CollegeStore, LockoutPolicy, MemoryStore, TokenIssuer,
};

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 계정 저장소
    pub accounts: Arc<dyn AccountStore>,

    /// 대학 저장소
    pub colleges: Arc<dyn CollegeStore>,

    /// 세션 토큰 발급자/검증자
    pub tokens: Arc<TokenIssuer>,

    /// 로그인/비밀번호 관리 서비스
    pub auth: Arc<AuthService>,

    /// 데이터베이스 연결 풀 (PostgreSQL, 없으면 인메모리 저장소 사용 중)
    pub db_pool: Option<sqlx::PgPool>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// # 인자
    /// * `accounts` - 계정 저장소
    /// * `colleges` - 대학 저장소
    /// * `tokens` - 토큰 발급자
    /// * `policy` - 로그인 실패 잠금 정책
    /// * `reset_ttl` - 비밀번호 재설정 토큰 유효 기간
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        colleges: Arc<dyn CollegeStore>,
        tokens: Arc<TokenIssuer>,
        policy: LockoutPolicy,
        reset_ttl: Duration,
    ) -> AuthResult<Self> {
        let auth = AuthService::new(
            accounts.clone(),
            colleges.clone(),
            tokens.clone(),
            policy,
            reset_ttl,
        )?;

        Ok(Self {
            accounts,
            colleges,
            tokens,
            auth: Arc::new(auth),
            db_pool: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 인메모리 저장소 기반 AppState 생성.
    ///
    /// 데이터베이스가 설정되지 않은 개발 환경과 테스트에서 사용합니다.
    pub fn in_memory(
        store: MemoryStore,
        tokens: Arc<TokenIssuer>,
        policy: LockoutPolicy,
        reset_ttl: Duration,
    ) -> AuthResult<Self> {
        Self::new(
            Arc::new(store.clone()),
            Arc::new(store),
            tokens,
            policy,
            reset_ttl,
        )
    }

    /// 데이터베이스 연결 풀 설정 (readiness 점검용).
    pub fn with_db_pool(mut self, pool: sqlx::PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 AppState 생성 (인메모리 저장소, 기본 정책).
#[cfg(test)]
pub fn create_test_state() -> AppState {
    use secrecy::SecretString;

    let secret = SecretString::new("test-secret-key-that-is-long-enough-for-hs256".into());
    let tokens = Arc::new(TokenIssuer::new(&secret, Duration::hours(24)));
    AppState::in_memory(
        MemoryStore::new(),
        tokens,
        LockoutPolicy::default(),
        Duration::hours(1),
    )
    .expect("Failed to create test state")
}
