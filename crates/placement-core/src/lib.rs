//! # Placement Core
//!
//! 캠퍼스 채용 플랫폼의 접근 제어 코어입니다.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 자격증명 검증과 로그인 실패 잠금
//! - 세션 토큰 발급/검증
//! - 역할과 소속 대학 기반 권한 판단
//! - 계정/대학 저장소 추상화와 인메모리 구현
//! - 설정 관리
//! - 로깅 인프라

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod store;

pub use auth::{AuthService, Claims, CredentialVerifier, IssuedToken, LoginOutcome, TokenIssuer};
pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use store::MemoryStore;
