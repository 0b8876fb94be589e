//! 인증 및 권한 부여.
//!
//! 코어의 토큰 검증과 권한 게이트를 Axum 추출기로 노출합니다.
//!
//! # 구성 요소
//!
//! - [`JwtAuth`]: Authorization 헤더의 Bearer 토큰을 검증하는 추출기
//! - [`SuperAdminAuth`]: 슈퍼관리자 역할을 요구하는 추출기
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     JwtAuth(claims): JwtAuth,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.username)
//! }
//! ```

mod middleware;

pub use middleware::{require_roles, JwtAuth, JwtAuthError, SuperAdminAuth};
