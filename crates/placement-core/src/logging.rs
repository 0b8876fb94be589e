//! tracing을 사용한 로깅 인프라.
//!
//! 출력 형식은 세 가지입니다:
//! - **pretty**: 개발용 사람이 읽기 쉬운 형식
//! - **json**: 운영환경/로그 집계용 JSON 형식
//! - **compact**: 로그 크기를 줄이기 위한 간결한 형식
//!
//! `RUST_LOG`가 설정되어 있으면 설정 파일의 레벨보다, `LOG_FORMAT`이
//! 설정되어 있으면 설정 파일의 형식보다 우선합니다.
//! 인증 관련 로그에는 비밀번호, 해시, 토큰 값을 남기지 않습니다.

use crate::config::LoggingConfig;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// 출력 형식을 덮어쓰는 환경 변수
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// 외부 크레이트 기본 필터 (레벨 지정이 없을 때 덧붙임)
const DEPENDENCY_FILTERS: &str = "sqlx=warn,hyper=warn,tower_http=info";

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 색상이 포함된 사람이 읽기 쉬운 형식 (개발용)
    #[default]
    Pretty,
    /// 로그 집계용 JSON 형식 (운영용)
    Json,
    /// 간결한 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 로깅 초기화 에러.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("잘못된 로그 필터 '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("로깅이 이미 초기화되었습니다: {0}")]
    AlreadyInitialized(String),
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 로그 레벨 필터 (예: "info", "placement_core=debug")
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
    /// span 종료 이벤트 포함 여부 (요청 처리 시간 확인용)
    pub with_span_events: bool,
    /// 파일명과 줄 번호 포함 여부
    pub with_file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_span_events: false,
            with_file: true,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    /// 형식 덮어쓰기. 알 수 없는 값은 무시합니다.
    pub fn override_format(mut self, value: Option<&str>) -> Self {
        if let Some(format) = value.and_then(|v| v.parse().ok()) {
            self.format = format;
        }
        self
    }

    /// `LOG_FORMAT` 환경 변수 적용.
    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(LOG_FORMAT_ENV).ok();
        self.override_format(value.as_deref())
    }

    /// 실제 적용할 필터 문자열.
    ///
    /// 레벨에 모듈 지시어가 없으면 외부 크레이트 기본 필터를 덧붙입니다.
    pub fn filter_directives(&self) -> String {
        if self.level.contains('=') {
            self.level.clone()
        } else {
            format!("{},{}", self.level, DEPENDENCY_FILTERS)
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.with_span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_file)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            format: config.format.parse().unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// 주어진 설정으로 로깅 시스템을 초기화합니다.
///
/// # 예제
///
/// ```no_run
/// use placement_core::logging::{init_logging, LogConfig, LogFormat};
///
/// let config = LogConfig::new("debug").with_format(LogFormat::Json);
/// init_logging(config).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    let directives = config.filter_directives();
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
            filter: directives.clone(),
            reason: e.to_string(),
        })?,
    };

    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(env_filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        format = ?config.format,
        filter = %directives,
        "Logging initialized"
    );

    Ok(())
}
