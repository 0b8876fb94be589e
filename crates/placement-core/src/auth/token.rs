//! 세션 토큰 발급/검증.
//!
//! HS256 서명 JWT를 사용하는 무상태 토큰입니다. 서버에는 세션 저장소가
//! 없으며 토큰은 만료되거나 서명 비밀 키가 교체될 때만 무효화됩니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, Role};
use crate::error::{AuthError, AuthResult};

/// 세션 토큰 페이로드.
///
/// 계정 식별자, 역할, 소속 대학을 포함하므로 권한 판단에 추가
/// 데이터베이스 조회가 필요하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 계정 ID
    pub sub: String,
    /// 사용자 이름
    pub username: String,
    /// 사용자 역할
    pub role: Role,
    /// 소속 대학 (슈퍼관리자는 없음)
    pub college_id: Option<Uuid>,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    pub jti: String,
}

impl Claims {
    /// 계정에 대한 Claims 생성.
    pub fn for_account(account: &Account, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: account.id.to_string(),
            username: account.username.clone(),
            role: account.role,
            college_id: account.college_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// 계정 ID 파싱.
    pub fn account_id(&self) -> AuthResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::Malformed)
    }

    /// 주어진 시각에 만료되었는지 확인.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

/// 발급된 토큰.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// 서명된 JWT 문자열
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: i64,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// 토큰 발급자/검증자.
///
/// 서명 키는 생성 시점에 한 번 만들어지며 이후 읽기 전용입니다.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// 새 발급자 생성.
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC 서명 비밀 키
    /// * `ttl` - 토큰 유효 기간
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    /// 토큰 유효 기간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 계정에 대한 토큰 발급.
    pub fn issue(&self, account: &Account) -> AuthResult<IssuedToken> {
        self.issue_at(account, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰 발급.
    pub fn issue_at(&self, account: &Account, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let claims = Claims::for_account(account, now, self.ttl);
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.num_seconds(),
            expires_at: now + self.ttl,
        })
    }

    /// 토큰 검증.
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        self.validate_at(token, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰 검증.
    ///
    /// 서명을 먼저 확인하고, 서명이 유효한 경우에만 만료를 판단합니다.
    ///
    /// # Errors
    ///
    /// - `AuthError::Malformed`: 서명 불일치, 구조 오류, 잘못된 계정 ID
    /// - `AuthError::Expired`: `now`가 만료 시각을 지남
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 아래에서 `now` 기준으로 직접 판단
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::Malformed
            })?
            .claims;

        claims.account_id()?;

        if claims.is_expired_at(now) {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}
