//! Rate limiting middleware.
//!
//! Token Bucket 알고리즘 기반으로 인증 엔드포인트의 IP별 요청 수를
//! 제한합니다. 로그인 제한기는 성공한 요청의 토큰을 돌려주므로 실패한
//! 시도만 한도에 반영됩니다.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::ApiErrorResponse;
use placement_core::RateLimitSettings;

/// Rate Limiter 설정.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 윈도우당 최대 요청 수 (버킷 용량)
    pub max_requests: u32,
    /// 윈도우 길이 (버킷이 비었다가 가득 찰 때까지의 시간)
    pub window: Duration,
    /// 성공 응답(2xx)의 토큰 반환 여부
    pub refund_success: bool,
    /// X-Forwarded-For / X-Real-IP 헤더 신뢰 여부
    pub trust_proxy_headers: bool,
}

impl RateLimitConfig {
    /// 새 설정 생성.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            refund_success: false,
            trust_proxy_headers: false,
        }
    }

    /// 성공 응답은 한도에 반영하지 않도록 설정.
    pub fn refund_success(mut self) -> Self {
        self.refund_success = true;
        self
    }

    /// 로그인 제한 설정 (기본: 15분에 5회, 성공 제외).
    pub fn login(settings: &RateLimitSettings) -> Self {
        Self {
            trust_proxy_headers: settings.trust_proxy_headers,
            ..Self::new(
                settings.login_max_attempts,
                Duration::from_secs(settings.login_window_secs),
            )
            .refund_success()
        }
    }

    /// 비밀번호 재설정 제한 설정 (기본: 1시간에 3회).
    pub fn password_reset(settings: &RateLimitSettings) -> Self {
        Self {
            trust_proxy_headers: settings.trust_proxy_headers,
            ..Self::new(
                settings.reset_max_attempts,
                Duration::from_secs(settings.reset_window_secs),
            )
        }
    }
}

/// Token Bucket 구조체.
#[derive(Debug)]
struct TokenBucket {
    /// 현재 토큰 수
    tokens: f64,
    /// 마지막 리필 시간
    last_refill: Instant,
    /// 최대 토큰 수 (버킷 용량)
    max_tokens: f64,
    /// 초당 리필되는 토큰 수
    refill_rate: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        let max_tokens = config.max_requests as f64;
        let refill_rate = max_tokens / config.window.as_secs_f64().max(f64::EPSILON);

        Self {
            tokens: max_tokens,
            last_refill: Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// 토큰 소비 시도.
    ///
    /// 성공하면 `true`, Rate limit 초과 시 `false` 반환.
    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// 소비한 토큰 하나를 반환.
    fn release(&mut self) {
        self.refill();
        self.tokens = (self.tokens + 1.0).min(self.max_tokens);
    }

    /// 토큰 리필.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    /// 다음 토큰까지 대기 시간 (초).
    fn time_until_next_token(&self) -> f64 {
        if self.tokens >= 1.0 {
            0.0
        } else {
            (1.0 - self.tokens) / self.refill_rate
        }
    }
}

/// Rate Limiter.
///
/// IP 주소별로 Rate Limiting을 적용합니다.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Arc<RwLock<HashMap<IpAddr, TokenBucket>>>,
}

impl RateLimiter {
    /// 새 Rate Limiter 생성.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// 요청 허용 여부 확인.
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let mut buckets = self.buckets.write().await;

        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(&self.config));

        if bucket.try_acquire() {
            RateLimitResult::Allowed
        } else {
            let retry_after = bucket.time_until_next_token().ceil().max(1.0) as u64;
            RateLimitResult::Limited { retry_after }
        }
    }

    /// 소비한 토큰 반환.
    pub async fn refund(&self, ip: IpAddr) {
        if let Some(bucket) = self.buckets.write().await.get_mut(&ip) {
            bucket.release();
        }
    }

    /// 오래된 버킷 정리.
    ///
    /// 윈도우 이상 사용되지 않은 버킷은 이미 가득 찼으므로 제거해도
    /// 결과가 같습니다.
    pub async fn cleanup(&self) {
        let mut buckets = self.buckets.write().await;
        let Some(threshold) = Instant::now().checked_sub(self.config.window) else {
            return;
        };

        buckets.retain(|_, bucket| bucket.last_refill > threshold);
    }

    /// 현재 추적 중인 IP 수 반환.
    pub async fn tracked_ips(&self) -> usize {
        self.buckets.read().await.len()
    }
}

/// Rate Limit 확인 결과.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// 요청 허용됨
    Allowed,
    /// Rate limit 초과
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

/// Rate Limit 미들웨어 상태.
#[derive(Clone)]
pub struct RateLimitState {
    /// 메트릭 라벨용 이름 (예: "login")
    name: &'static str,
    limiter: RateLimiter,
}

impl RateLimitState {
    pub fn new(name: &'static str, config: RateLimitConfig) -> Self {
        Self {
            name,
            limiter: RateLimiter::new(config),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

/// Rate Limiting 미들웨어 함수.
///
/// 클라이언트 IP별로 Rate Limiting을 적용합니다.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_client_ip(&request, state.limiter.config.trust_proxy_headers);

    match state.limiter.check(ip).await {
        RateLimitResult::Allowed => {
            counter!("rate_limit_requests_total", "limiter" => state.name, "status" => "allowed")
                .increment(1);
            let response = next.run(request).await;

            if state.limiter.config.refund_success && response.status().is_success() {
                state.limiter.refund(ip).await;
            }
            response
        }
        RateLimitResult::Limited { retry_after } => {
            counter!("rate_limit_requests_total", "limiter" => state.name, "status" => "limited")
                .increment(1);

            tracing::warn!(
                limiter = state.name,
                client_ip = %ip,
                retry_after = retry_after,
                "Rate limit exceeded"
            );

            let body = ApiErrorResponse::with_details(
                "RATE_LIMITED",
                "요청이 너무 많습니다. 잠시 후 다시 시도하세요",
                serde_json::json!({ "retry_after": retry_after }),
            );
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

            // Retry-After 헤더 추가
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));

            response
        }
    }
}

/// 요청에서 클라이언트 IP 추출.
///
/// `trust_proxy_headers`가 켜져 있으면 X-Forwarded-For, X-Real-IP 헤더를
/// 우선 확인합니다 (프록시/로드밸런서 뒤에 있을 경우). 그 외에는 연결
/// 정보를 사용합니다.
fn extract_client_ip(request: &Request, trust_proxy_headers: bool) -> IpAddr {
    if trust_proxy_headers {
        // X-Forwarded-For 헤더 확인 (첫 번째 IP가 클라이언트 원본)
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse().ok());
        if let Some(ip) = forwarded {
            return ip;
        }

        // X-Real-IP 헤더 확인
        let real_ip = request
            .headers()
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok());
        if let Some(ip) = real_ip {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
