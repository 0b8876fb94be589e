//! 인증/대학 라우트 통합 테스트.
//!
//! 인메모리 저장소로 전체 API 라우터를 구성하고 `oneshot`으로 요청을
//! 보냅니다.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use placement_api::routes::{create_api_router, AuthRateLimits};
use placement_api::state::AppState;
use placement_core::auth::hash_password;
use placement_core::{
    Account, AccountStore, College, LockoutPolicy, MemoryStore, RateLimitSettings, Role,
    TokenIssuer,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "Password1";

struct TestApp {
    state: Arc<AppState>,
    store: MemoryStore,
    router: Router,
    college_a: College,
    college_b: College,
}

impl TestApp {
    async fn new(limits: Option<&AuthRateLimits>) -> Self {
        let store = MemoryStore::new();
        let college_a = College::new("Alpha Institute", "alp");
        let college_b = College::new("Beta College", "bet");
        store.insert_college(college_a.clone()).await;
        store.insert_college(college_b.clone()).await;

        let tokens = Arc::new(TokenIssuer::new(
            &SecretString::new("integration-test-secret-of-sufficient-length".into()),
            Duration::hours(24),
        ));
        let state = Arc::new(
            AppState::in_memory(
                store.clone(),
                tokens,
                LockoutPolicy::default(),
                Duration::hours(1),
            )
            .unwrap(),
        );
        let router = create_api_router(limits).with_state(state.clone());

        Self {
            state,
            store,
            router,
            college_a,
            college_b,
        }
    }

    async fn add_account(&self, username: &str, role: Role, college: Option<&College>) -> Account {
        let account = Account::new(
            username,
            &format!("{}@campus.edu", username),
            hash_password(PASSWORD).unwrap(),
            role,
            college.map(|c| c.id),
        )
        .unwrap();
        self.store.insert_account(&account).await.unwrap();
        account
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(post_json(
            "/api/auth/login",
            json!({ "username": username, "password": password }),
        ))
        .await
    }

    async fn token_for(&self, username: &str) -> String {
        let (status, body) = self.login(username, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

// ==================== 로그인 ====================

#[tokio::test]
async fn test_login_returns_token_and_profile() {
    let app = TestApp::new(None).await;
    let account = app
        .add_account("mod_a", Role::Moderator, Some(&app.college_a))
        .await;

    let (status, body) = app.login("MOD_A", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 24 * 3600);
    assert_eq!(body["account"]["id"], account.id.to_string());
    assert_eq!(body["account"]["role"], "moderator");

    let token = body["access_token"].as_str().unwrap();
    let (status, me) = app.send(get_with_token("/api/auth/me", Some(token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "mod_a");
    assert_eq!(me["college_id"], app.college_a.id.to_string());
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
    let app = TestApp::new(None).await;
    app.add_account("student1", Role::Student, Some(&app.college_a))
        .await;

    let (unknown_status, unknown) = app.login("nobody", PASSWORD).await;
    let (wrong_status, wrong) = app.login("student1", "Wrong1234").await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown["code"], "INVALID_CREDENTIALS");
    assert_eq!(unknown["code"], wrong["code"]);
    assert_eq!(unknown["message"], wrong["message"]);
}

#[tokio::test]
async fn test_lockout_after_five_failures() {
    let app = TestApp::new(None).await;
    app.add_account("student1", Role::Student, Some(&app.college_a))
        .await;

    for _ in 0..5 {
        let (status, _) = app.login("student1", "Wrong1234").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // 올바른 비밀번호도 잠금 기간에는 거부
    let (status, body) = app.login("student1", PASSWORD).await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["code"], "ACCOUNT_LOCKED");
    assert!(body["details"]["locked_until"].is_string());
}

#[tokio::test]
async fn test_inactive_college_rejected() {
    let app = TestApp::new(None).await;
    let mut closed = College::new("Closed Campus", "cls");
    closed.status = placement_core::CollegeStatus::Inactive;
    app.store.insert_college(closed.clone()).await;
    app.add_account("student1", Role::Student, Some(&closed))
        .await;

    let (status, body) = app.login("student1", PASSWORD).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "COLLEGE_INACTIVE");
}

#[tokio::test]
async fn test_login_validation_error() {
    let app = TestApp::new(None).await;
    let (status, body) = app.login("", PASSWORD).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// ==================== 토큰 ====================

#[tokio::test]
async fn test_me_requires_valid_token() {
    let app = TestApp::new(None).await;
    let account = app
        .add_account("student1", Role::Student, Some(&app.college_a))
        .await;

    let (status, body) = app.send(get_with_token("/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_TOKEN");

    let (status, body) = app
        .send(get_with_token("/api/auth/me", Some("not.a.jwt")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");

    let expired = app
        .state
        .tokens
        .issue_at(&account, Utc::now() - Duration::hours(25))
        .unwrap();
    let (status, body) = app
        .send(get_with_token("/api/auth/me", Some(&expired.access_token)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let app = TestApp::new(None).await;
    let account = app
        .add_account("student1", Role::Student, Some(&app.college_a))
        .await;

    let foreign = TokenIssuer::new(
        &SecretString::new("a-completely-different-signing-secret-value".into()),
        Duration::hours(24),
    );
    let token = foreign.issue(&account).unwrap();

    let (status, body) = app
        .send(get_with_token("/api/auth/me", Some(&token.access_token)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

// ==================== 대학 격리 ====================

#[tokio::test]
async fn test_college_isolation() {
    let app = TestApp::new(None).await;
    app.add_account("mod_a", Role::Moderator, Some(&app.college_a))
        .await;
    let token = app.token_for("mod_a").await;

    let own = format!("/api/colleges/{}", app.college_a.id);
    let (status, body) = app.send(get_with_token(&own, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "ALP");

    let other = format!("/api/colleges/{}", app.college_b.id);
    let (status, body) = app.send(get_with_token(&other, Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // 존재하지 않는 대학도 같은 403
    let missing = format!("/api/colleges/{}", uuid::Uuid::new_v4());
    let (status, _) = app.send(get_with_token(&missing, Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_superadmin_sees_all_colleges() {
    let app = TestApp::new(None).await;
    app.add_account("root", Role::SuperAdmin, None).await;
    app.add_account("admin_a", Role::Admin, Some(&app.college_a))
        .await;

    let root = app.token_for("root").await;
    let (status, body) = app
        .send(get_with_token("/api/colleges", Some(&root)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["colleges"][0]["name"], "Alpha Institute");

    let other = format!("/api/colleges/{}", app.college_b.id);
    let (status, _) = app.send(get_with_token(&other, Some(&root))).await;
    assert_eq!(status, StatusCode::OK);

    let missing = format!("/api/colleges/{}", uuid::Uuid::new_v4());
    let (status, body) = app.send(get_with_token(&missing, Some(&root))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let admin = app.token_for("admin_a").await;
    let (status, _) = app
        .send(get_with_token("/api/colleges", Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ==================== 비밀번호 ====================

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new(None).await;
    app.add_account("student1", Role::Student, Some(&app.college_a))
        .await;
    let token = app.token_for("student1").await;

    let request = |current: &str, new: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/auth/change-password")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(
                json!({ "current_password": current, "new_password": new }).to_string(),
            ))
            .unwrap()
    };

    let (status, body) = app.send(request(PASSWORD, "short")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "WEAK_PASSWORD");

    let (status, body) = app.send(request("Wrong1234", "NewPassword2")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, _) = app.send(request(PASSWORD, "NewPassword2")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("student1", "NewPassword2").await;
    assert_eq!(status, StatusCode::OK);
}

fn change_password_request(token: &str, current: &str, new: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/change-password")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(
            json!({ "current_password": current, "new_password": new }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_change_password_guesses_lock_account() {
    let app = TestApp::new(None).await;
    let account = app
        .add_account("student1", Role::Student, Some(&app.college_a))
        .await;
    let token = app.token_for("student1").await;

    for _ in 0..5 {
        let (status, _) = app
            .send(change_password_request(&token, "Guess1234", "NewPassword2"))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let stored = app.store.find_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.lock.failed_attempts, 5);

    // 잠긴 계정은 올바른 현재 비밀번호로도 변경 불가
    let (status, body) = app
        .send(change_password_request(&token, PASSWORD, "NewPassword2"))
        .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["code"], "ACCOUNT_LOCKED");

    let (status, _) = app.login("student1", PASSWORD).await;
    assert_eq!(status, StatusCode::LOCKED);
}

#[tokio::test]
async fn test_forgot_password_response_is_uniform() {
    let app = TestApp::new(None).await;
    app.add_account("student1", Role::Student, Some(&app.college_a))
        .await;

    let (known_status, known) = app
        .send(post_json(
            "/api/auth/forgot-password",
            json!({ "username": "student1", "email": "student1@campus.edu" }),
        ))
        .await;
    let (unknown_status, unknown) = app
        .send(post_json(
            "/api/auth/forgot-password",
            json!({ "username": "ghost", "email": "ghost@campus.edu" }),
        ))
        .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known, unknown);
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = TestApp::new(None).await;
    app.add_account("student1", Role::Student, Some(&app.college_a))
        .await;

    // 잠금 상태에서도 재설정 후 로그인 가능
    for _ in 0..5 {
        app.login("student1", "Wrong1234").await;
    }

    let raw = app
        .state
        .auth
        .request_password_reset("student1", "student1@campus.edu")
        .await
        .unwrap();

    let (status, body) = app
        .send(post_json(
            "/api/auth/reset-password",
            json!({ "token": "deadbeef", "new_password": "Recovered9" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RESET_TOKEN");

    let (status, _) = app
        .send(post_json(
            "/api/auth/reset-password",
            json!({ "token": raw, "new_password": "Recovered9" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("student1", "Recovered9").await;
    assert_eq!(status, StatusCode::OK);

    // 토큰은 한 번만 사용 가능
    let (status, _) = app
        .send(post_json(
            "/api/auth/reset-password",
            json!({ "token": raw, "new_password": "Another123" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ==================== Rate Limit ====================

#[tokio::test]
async fn test_login_rate_limited_after_failures() {
    let limits = AuthRateLimits::from_settings(&RateLimitSettings::default()).unwrap();
    let app = TestApp::new(Some(&limits)).await;

    for _ in 0..5 {
        let (status, _) = app.login("nobody", "Wrong1234").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "username": "nobody", "password": "Wrong1234" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn test_successful_logins_do_not_consume_limit() {
    let limits = AuthRateLimits::from_settings(&RateLimitSettings::default()).unwrap();
    let app = TestApp::new(Some(&limits)).await;
    app.add_account("student1", Role::Student, Some(&app.college_a))
        .await;

    for _ in 0..6 {
        let (status, _) = app.login("student1", PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_password_reset_rate_limited() {
    let limits = AuthRateLimits::from_settings(&RateLimitSettings::default()).unwrap();
    let app = TestApp::new(Some(&limits)).await;

    let forgot = || {
        post_json(
            "/api/auth/forgot-password",
            json!({ "username": "ghost", "email": "ghost@campus.edu" }),
        )
    };

    for _ in 0..3 {
        let (status, _) = app.send(forgot()).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app.send(forgot()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_change_password_shares_login_limit() {
    let limits = AuthRateLimits::from_settings(&RateLimitSettings::default()).unwrap();
    let app = TestApp::new(Some(&limits)).await;
    app.add_account("student1", Role::Student, Some(&app.college_a))
        .await;
    let token = app.token_for("student1").await;

    for _ in 0..4 {
        let (status, _) = app
            .send(change_password_request(&token, "Guess1234", "NewPassword2"))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, _) = app.login("student1", "Guess1234").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(change_password_request(&token, "Guess1234", "NewPassword2"))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");
}
