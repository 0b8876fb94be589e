//! 인증 및 인가 모듈.
//!
//! - [`CredentialVerifier`]: 사용자 이름/비밀번호 검증과 계정 잠금
//! - [`TokenIssuer`]: 세션 토큰 발급/검증
//! - [`gate`]: 역할과 소속 대학 기반 접근 판단
//! - [`AuthService`]: 위 구성요소를 묶은 로그인/비밀번호 관리 진입점

pub mod gate;
mod password;
mod reset;
mod service;
mod token;
mod verifier;

pub use gate::{assignment_college, authorize, resolve_college_scope};
pub use password::{
    hash_password, hash_password_blocking, validate_password_strength, verify_password,
    verify_password_blocking, PasswordError, MIN_PASSWORD_LENGTH,
};
pub use reset::{generate_reset_token, hash_reset_token, RESET_TOKEN_BYTES};
pub use service::{AuthService, LoginOutcome};
pub use token::{Claims, IssuedToken, TokenIssuer};
pub use verifier::{CredentialVerifier, Verified};
