//! API Integration Tests
//!
//! Every test drives the full router (trace layer, security headers, guard)
//! over a fresh in-memory store via `tower::ServiceExt::oneshot`.
//!
//! Author: hephaex@gmail.com

use acct_api::auth::jwt::{
    issue_access_token_at, issue_refresh_token_at, unix_now, verify_access_token, TokenClaims,
    TokenSubject,
};
use acct_api::create_router;
use acct_api::state::AppState;
use acct_api::testing::{create_router_for_testing, test_config, test_state, test_state_with_config};
use acct_core::RuntimeMode;
use acct_store::{MemoryUserStore, UserStore};
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    app: Router,
    state: Arc<AppState>,
    store: Arc<MemoryUserStore>,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestResponse {
    fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    fn access_token(&self) -> String {
        self.body["accessToken"].as_str().unwrap().to_string()
    }

    /// `refreshToken=<value>` pair from Set-Cookie, ready for a Cookie header
    fn refresh_cookie(&self) -> String {
        let set_cookie = self
            .headers
            .get(header::SET_COOKIE)
            .expect("Set-Cookie header")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().trim().to_string()
    }
}

impl TestApp {
    fn new() -> Self {
        let (state, store) = test_state();
        Self::from_parts(state, store)
    }

    fn with_mode(mode: RuntimeMode) -> Self {
        let mut config = test_config();
        config.runtime = mode;
        let (state, store) = test_state_with_config(config);
        Self::from_parts(state, store)
    }

    fn from_parts(state: Arc<AppState>, store: Arc<MemoryUserStore>) -> Self {
        Self {
            app: create_router(state.clone()),
            state,
            store,
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(create_json_request("POST", uri, Some(body))).await
    }

    async fn signup(&self, email: &str, password: &str) -> TestResponse {
        self.post_json("/api/auth/signup", signup_body(email, password))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json(
            "/api/auth/login",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn refresh(&self, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri("/api/auth/refresh");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn get_profile(&self, authorization: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn put_profile(&self, token: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method("PUT")
            .uri("/api/profile")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn signup_body(email: &str, password: &str) -> Value {
    json!({
        "name": "Test User",
        "firstName": "Test",
        "lastName": "User",
        "email": email,
        "password": password,
        "country": "KR",
        "contactNumber": "010-1234-5678",
        "location": "Seoul"
    })
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Flip the first character of the signature segment
fn tamper_signature(token: &str) -> String {
    let (head, signature) = token.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    format!("{head}.{}", chars.into_iter().collect::<String>())
}

fn assert_error_envelope(response: &TestResponse, status: StatusCode) {
    assert_eq!(response.status, status, "body: {}", response.body);
    assert_eq!(response.body["success"], false);
    assert!(response.body["message"].is_string());
}

// =============================================================================
// Health & API document
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "acct-test");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["paths"]["/api/auth/signup"].is_object());
    assert!(response.body["paths"]["/api/profile"]["put"].is_object());
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = TestApp::new();
    let response = app.get_profile(None).await;

    assert_eq!(
        response.headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert!(response
        .headers
        .get(header::STRICT_TRANSPORT_SECURITY)
        .is_none());
}

// =============================================================================
// Signup
// =============================================================================

#[tokio::test]
async fn test_signup_success() {
    let app = TestApp::new();
    let response = app.signup("new@example.com", "secret1").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.message(), "User registered successfully");
    assert_eq!(response.body["user"]["email"], "new@example.com");
    assert_eq!(response.body["user"]["name"], "Test User");
    assert!(response.body["user"]["id"].is_string());
    assert!(response.body.get("refreshToken").is_none());

    let set_cookie = response
        .headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("refreshToken="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Max-Age=604800"));
    assert!(!set_cookie.contains("Secure"));

    let claims = verify_access_token(&app.state.jwt_config, &response.access_token()).unwrap();
    assert_eq!(claims.email.as_deref(), Some("new@example.com"));
}

#[tokio::test]
async fn test_signup_stores_hash_not_plaintext() {
    let app = TestApp::new();
    let response = app.signup("hash@example.com", "secret1").await;
    assert_eq!(response.status, StatusCode::CREATED);

    let stored = app
        .store
        .find_by_email("hash@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(stored.password_hash, "secret1");
    assert!(!stored.password_hash.contains("secret1"));
    assert!(acct_api::auth::verify_password("secret1", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn test_signup_normalizes_email() {
    let app = TestApp::new();
    let response = app.signup("  Mixed.Case@Example.COM ", "secret1").await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["user"]["email"], "mixed.case@example.com");
}

#[tokio::test]
async fn test_signup_duplicate_email() {
    let app = TestApp::new();
    assert_eq!(
        app.signup("dup@example.com", "secret1").await.status,
        StatusCode::CREATED
    );

    let second = app.signup("dup@example.com", "another1").await;
    assert_error_envelope(&second, StatusCode::CONFLICT);
    assert_eq!(second.message(), "Email already in use");

    let differently_cased = app.signup("DUP@example.com", "another1").await;
    assert_error_envelope(&differently_cased, StatusCode::CONFLICT);

    assert_eq!(app.store.len().await, 1);
}

#[tokio::test]
async fn test_signup_missing_fields() {
    let app = TestApp::new();

    for field in ["name", "firstName", "email", "password", "contactNumber"] {
        let mut body = signup_body("missing@example.com", "secret1");
        body.as_object_mut().unwrap().remove(field);

        let response = app.post_json("/api/auth/signup", body).await;
        assert_error_envelope(&response, StatusCode::BAD_REQUEST);
        assert_eq!(response.message(), "Missing required fields", "field {field}");
    }

    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_signup_field_rules() {
    let app = TestApp::new();

    let response = app.signup("not-an-email", "secret1").await;
    assert_error_envelope(&response, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("valid email"));

    let response = app.signup("short@example.com", "12345").await;
    assert_error_envelope(&response, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("at least 6"));

    let mut body = signup_body("name@example.com", "secret1");
    body["name"] = json!("N");
    let response = app.post_json("/api/auth/signup", body).await;
    assert_error_envelope(&response, StatusCode::BAD_REQUEST);

    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_signup_rejects_email_without_tld() {
    let app = TestApp::new();

    for email in ["a@b", "user@localhost"] {
        let response = app.signup(email, "secret1").await;
        assert_error_envelope(&response, StatusCode::BAD_REQUEST);
        assert_eq!(response.message(), "Please enter a valid email", "{email}");
    }

    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/signup")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.send(request).await;
    assert_error_envelope(&response, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid request body");
}

#[tokio::test]
async fn test_wrong_json_type_hides_parser_detail() {
    let app = TestApp::new();
    let mut body = signup_body("types@example.com", "secret1");
    body["contactNumber"] = json!(5551234);

    let response = app.post_json("/api/auth/signup", body).await;
    assert_error_envelope(&response, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid request body");
    assert!(!response.body.to_string().contains("invalid type"));
}

#[tokio::test]
async fn test_production_mode_cookie_and_hsts() {
    let app = TestApp::with_mode(RuntimeMode::Production);
    let response = app.signup("prod@example.com", "secret1").await;

    assert_eq!(response.status, StatusCode::CREATED);
    let set_cookie = response
        .headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("; Secure"));
    assert!(response
        .headers
        .get(header::STRICT_TRANSPORT_SECURITY)
        .is_some());
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_signup_login_scenario() {
    let app = TestApp::new();

    let signup = app.signup("a@b.com", "secret1").await;
    assert_eq!(signup.status, StatusCode::CREATED);
    assert!(signup.headers.get(header::SET_COOKIE).is_some());

    let wrong = app.login("a@b.com", "wrongpass").await;
    assert_error_envelope(&wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.message(), "Invalid credentials");

    let right = app.login("a@b.com", "secret1").await;
    assert_eq!(right.status, StatusCode::OK);
    assert_eq!(right.message(), "Login successful");
    assert_eq!(right.body["user"]["id"], signup.body["user"]["id"]);
    assert!(right.headers.get(header::SET_COOKIE).is_some());
    assert_ne!(right.access_token(), signup.access_token());
}

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let app = TestApp::new();
    app.signup("known@example.com", "secret1").await;

    let unknown = app.login("unknown@example.com", "secret1").await;
    let wrong = app.login("known@example.com", "secret2").await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, wrong.status);
    assert_eq!(unknown.body, wrong.body);
    assert!(unknown.headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/auth/login", json!({ "email": "a@b.com" }))
        .await;
    assert_error_envelope(&response, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Email and password required");

    let response = app
        .post_json("/api/auth/login", json!({ "email": "", "password": "secret1" }))
        .await;
    assert_error_envelope(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = TestApp::new();
    app.signup("case@example.com", "secret1").await;

    let response = app.login("CASE@Example.com", "secret1").await;
    assert_eq!(response.status, StatusCode::OK);
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_without_cookie() {
    let app = TestApp::new();
    let response = app.refresh(None).await;

    assert_error_envelope(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), "No refresh token provided");
}

#[tokio::test]
async fn test_refresh_issues_new_access_token() {
    let app = TestApp::new();
    let login = {
        app.signup("refresh@example.com", "secret1").await;
        app.login("refresh@example.com", "secret1").await
    };

    let response = app.refresh(Some(&login.refresh_cookie())).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "New access token issued");
    assert!(response.headers.get(header::SET_COOKIE).is_none());

    let claims = verify_access_token(&app.state.jwt_config, &response.access_token()).unwrap();
    assert_eq!(
        claims.subject_id().unwrap().to_string(),
        login.body["user"]["id"].as_str().unwrap()
    );
    assert_eq!(claims.email, None);
}

#[tokio::test]
async fn test_refresh_after_access_token_expiry() {
    let app = TestApp::new();
    let signup = app.signup("replay@example.com", "secret1").await;
    let user_id = Uuid::parse_str(signup.body["user"]["id"].as_str().unwrap()).unwrap();

    let stale = issue_access_token_at(
        &app.state.jwt_config,
        &TokenSubject::new(user_id, "replay@example.com"),
        unix_now().unwrap() - Duration::from_secs(16 * 60),
    )
    .unwrap();
    let rejected = app.get_profile(Some(&bearer(&stale))).await;
    assert_error_envelope(&rejected, StatusCode::UNAUTHORIZED);

    let refreshed = app.refresh(Some(&signup.refresh_cookie())).await;
    assert_eq!(refreshed.status, StatusCode::OK);

    let profile = app
        .get_profile(Some(&bearer(&refreshed.access_token())))
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["user"]["email"], "replay@example.com");
}

#[tokio::test]
async fn test_tampered_refresh_token_matches_expired() {
    let app = TestApp::new();
    let signup = app.signup("tamper@example.com", "secret1").await;
    let user_id = Uuid::parse_str(signup.body["user"]["id"].as_str().unwrap()).unwrap();

    let cookie = signup.refresh_cookie();
    let token = cookie.strip_prefix("refreshToken=").unwrap();
    let tampered = app
        .refresh(Some(&format!("refreshToken={}", tamper_signature(token))))
        .await;

    let expired_token = issue_refresh_token_at(
        &app.state.jwt_config,
        &TokenSubject::id_only(user_id),
        unix_now().unwrap() - Duration::from_secs(8 * 24 * 60 * 60),
    )
    .unwrap();
    let expired = app
        .refresh(Some(&format!("refreshToken={expired_token}")))
        .await;

    assert_error_envelope(&tampered, StatusCode::FORBIDDEN);
    assert_eq!(tampered.status, expired.status);
    assert_eq!(tampered.body, expired.body);
    assert_eq!(tampered.message(), "Invalid or expired refresh token");
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = TestApp::new();
    let signup = app.signup("kinds@example.com", "secret1").await;

    let response = app
        .refresh(Some(&format!("refreshToken={}", signup.access_token())))
        .await;
    assert_error_envelope(&response, StatusCode::FORBIDDEN);

    // ...and a refresh token is not an access token
    let cookie = signup.refresh_cookie();
    let refresh_token = cookie.strip_prefix("refreshToken=").unwrap();
    let response = app.get_profile(Some(&bearer(refresh_token))).await;
    assert_error_envelope(&response, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Access guard & profile
// =============================================================================

#[tokio::test]
async fn test_profile_requires_bearer_token() {
    let app = TestApp::new();

    let missing = app.get_profile(None).await;
    assert_error_envelope(&missing, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.message(), "Not authorized, no token");

    let wrong_scheme = app.get_profile(Some("Token abc.def.ghi")).await;
    assert_error_envelope(&wrong_scheme, StatusCode::UNAUTHORIZED);

    let garbage = app.get_profile(Some("Bearer not-a-jwt")).await;
    assert_error_envelope(&garbage, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.message(), "Not authorized, token failed");
}

#[tokio::test]
async fn test_profile_returns_user_without_hash() {
    let app = TestApp::new();
    let signup = app.signup("profile@example.com", "secret1").await;

    let response = app
        .get_profile(Some(&bearer(&signup.access_token())))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Profile fetched successfully");

    let user = &response.body["user"];
    assert_eq!(user["email"], "profile@example.com");
    assert_eq!(user["firstName"], "Test");
    assert_eq!(user["contactNumber"], "010-1234-5678");
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());
    assert!(!response.body.to_string().contains("argon2"));
}

#[tokio::test]
async fn test_access_token_expiry_boundary() {
    let app = TestApp::new();
    let signup = app.signup("boundary@example.com", "secret1").await;
    let user_id = Uuid::parse_str(signup.body["user"]["id"].as_str().unwrap()).unwrap();
    let subject = TokenSubject::new(user_id, "boundary@example.com");
    let now = unix_now().unwrap();

    let fresh_enough = issue_access_token_at(
        &app.state.jwt_config,
        &subject,
        now - Duration::from_secs(14 * 60 + 58),
    )
    .unwrap();
    let too_old = issue_access_token_at(
        &app.state.jwt_config,
        &subject,
        now - Duration::from_secs(15 * 60 + 1),
    )
    .unwrap();

    let accepted = app.get_profile(Some(&bearer(&fresh_enough))).await;
    assert_eq!(accepted.status, StatusCode::OK);

    let rejected = app.get_profile(Some(&bearer(&too_old))).await;
    assert_error_envelope(&rejected, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_access_token_matches_expired() {
    let app = TestApp::new();
    let signup = app.signup("oracle@example.com", "secret1").await;
    let user_id = Uuid::parse_str(signup.body["user"]["id"].as_str().unwrap()).unwrap();

    let tampered = app
        .get_profile(Some(&bearer(&tamper_signature(&signup.access_token()))))
        .await;
    let expired_token = issue_access_token_at(
        &app.state.jwt_config,
        &TokenSubject::new(user_id, "oracle@example.com"),
        unix_now().unwrap() - Duration::from_secs(60 * 60),
    )
    .unwrap();
    let expired = app.get_profile(Some(&bearer(&expired_token))).await;

    assert_eq!(tampered.status, StatusCode::UNAUTHORIZED);
    assert_eq!(tampered.status, expired.status);
    assert_eq!(tampered.body, expired.body);
}

#[tokio::test]
async fn test_deleted_user_token_yields_not_found() {
    let app = TestApp::new();
    let signup = app.signup("gone@example.com", "secret1").await;
    let user_id = Uuid::parse_str(signup.body["user"]["id"].as_str().unwrap()).unwrap();

    assert!(app.store.delete(user_id).await.unwrap());

    let response = app
        .get_profile(Some(&bearer(&signup.access_token())))
        .await;
    assert_error_envelope(&response, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "User not found");
}

#[tokio::test]
async fn test_token_for_unknown_subject_yields_not_found() {
    let app = TestApp::new();
    let token = issue_access_token_at(
        &app.state.jwt_config,
        &TokenSubject::id_only(Uuid::new_v4()),
        unix_now().unwrap(),
    )
    .unwrap();

    let response = app.get_profile(Some(&bearer(&token))).await;
    assert_error_envelope(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_profile_partial() {
    let app = TestApp::new();
    let signup = app.signup("update@example.com", "secret1").await;
    let token = signup.access_token();

    let response = app
        .put_profile(
            &token,
            json!({
                "name": "  Updated Name ",
                "country": "",
                "location": null,
                "email": "attacker@example.com"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Profile updated successfully");

    let user = &response.body["user"];
    assert_eq!(user["name"], "Updated Name");
    assert_eq!(user["country"], "KR");
    assert_eq!(user["location"], "Seoul");
    assert_eq!(user["email"], "update@example.com");
    assert_eq!(user["firstName"], "Test");

    // Persisted, and the password is untouched
    let login = app.login("update@example.com", "secret1").await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["name"], "Updated Name");
}

#[tokio::test]
async fn test_update_profile_field_rules() {
    let app = TestApp::new();
    let signup = app.signup("rules@example.com", "secret1").await;

    let response = app
        .put_profile(&signup.access_token(), json!({ "firstName": "X" }))
        .await;
    assert_error_envelope(&response, StatusCode::BAD_REQUEST);

    let profile = app
        .get_profile(Some(&bearer(&signup.access_token())))
        .await;
    assert_eq!(profile.body["user"]["firstName"], "Test");
}

#[tokio::test]
async fn test_update_profile_requires_auth() {
    let app = TestApp::new();
    let request = create_json_request("PUT", "/api/profile", Some(json!({ "name": "Nobody" })));

    let response = app.send(request).await;
    assert_error_envelope(&response, StatusCode::UNAUTHORIZED);
}
