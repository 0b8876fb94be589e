//! 접근 제어를 위한 도메인 모델.

mod account;
mod college;
mod role;
mod store;

pub use account::*;
pub use college::*;
pub use role::*;
pub use store::*;
