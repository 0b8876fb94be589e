//! 비밀번호 재설정 토큰.
//!
//! 원본 토큰은 호출자에게만 전달하고 저장소에는 SHA-256 다이제스트만
//! 남깁니다.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// 재설정 토큰 바이트 길이.
pub const RESET_TOKEN_BYTES: usize = 32;

/// 새 재설정 토큰 생성.
///
/// # Returns
///
/// `(원본 hex 토큰, SHA-256 hex 다이제스트)`
pub fn generate_reset_token() -> (String, String) {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    let raw = hex::encode(bytes);
    let digest = hash_reset_token(&raw);
    (raw, digest)
}

/// 재설정 토큰 다이제스트 계산.
pub fn hash_reset_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
