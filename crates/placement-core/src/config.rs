//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! `config/default.toml`을 읽은 뒤 `PLACEMENT__` 접두사 환경 변수로
//! 덮어씁니다 (예: `PLACEMENT__AUTH__JWT_SECRET`).

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use crate::domain::LockoutPolicy;

/// JWT 서명 비밀 키 최소 길이.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// 기간 설정(분)의 상한 (1년)
pub const MAX_DURATION_MINUTES: i64 = 365 * 24 * 60;

/// 애플리케이션 설정.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 요청 제한 설정
    pub rate_limit: RateLimitSettings,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용할 CORS origin (비어 있으면 localhost 개발 origin)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 연결 URL (없으면 인메모리 저장소 사용)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 30,
        }
    }
}

/// 인증 설정.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 서명 비밀 키
    pub jwt_secret: SecretString,
    /// 토큰 유효 기간 (분)
    pub token_ttl_minutes: i64,
    /// 잠금까지 허용되는 연속 실패 횟수
    pub max_failed_attempts: u32,
    /// 잠금 유지 시간 (분)
    pub lockout_minutes: i64,
    /// 비밀번호 재설정 토큰 유효 기간 (분)
    pub reset_token_ttl_minutes: i64,
    /// 시작 시 생성할 슈퍼관리자
    pub bootstrap: Option<BootstrapConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::new(String::new().into()),
            token_ttl_minutes: 24 * 60,
            max_failed_attempts: 5,
            lockout_minutes: 15,
            reset_token_ttl_minutes: 60,
            bootstrap: None,
        }
    }
}

impl AuthConfig {
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_failed_attempts: self.max_failed_attempts,
            lockout: Duration::minutes(self.lockout_minutes),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::minutes(self.token_ttl_minutes)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::minutes(self.reset_token_ttl_minutes)
    }
}

/// 최초 슈퍼관리자 설정.
#[derive(Debug, Deserialize)]
pub struct BootstrapConfig {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

/// 인증 엔드포인트 요청 제한 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// 로그인: 윈도우당 IP별 허용 실패 횟수
    pub login_max_attempts: u32,
    /// 로그인: 윈도우 길이 (초)
    pub login_window_secs: u64,
    /// 비밀번호 재설정: 윈도우당 IP별 허용 요청 수
    pub reset_max_attempts: u32,
    /// 비밀번호 재설정: 윈도우 길이 (초)
    pub reset_window_secs: u64,
    /// 프록시 헤더(X-Forwarded-For)로 클라이언트 IP 판단 여부
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            login_max_attempts: 5,
            login_window_secs: 15 * 60,
            reset_max_attempts: 3,
            reset_window_secs: 60 * 60,
            trust_proxy_headers: false,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("PLACEMENT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }

    /// 설정 값 검증.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.jwt_secret.expose_secret().len() < MIN_JWT_SECRET_LENGTH {
            return Err(config::ConfigError::Message(format!(
                "auth.jwt_secret은 최소 {}자 이상이어야 합니다",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        if self.auth.max_failed_attempts == 0 {
            return Err(config::ConfigError::Message(
                "auth.max_failed_attempts는 1 이상이어야 합니다".to_string(),
            ));
        }
        for (key, minutes) in [
            ("auth.token_ttl_minutes", self.auth.token_ttl_minutes),
            ("auth.lockout_minutes", self.auth.lockout_minutes),
            ("auth.reset_token_ttl_minutes", self.auth.reset_token_ttl_minutes),
        ] {
            if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
                return Err(config::ConfigError::Message(format!(
                    "{}는 1 이상 {} 이하여야 합니다 (현재: {})",
                    key, MAX_DURATION_MINUTES, minutes
                )));
            }
        }
        Ok(())
    }
}
