#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
};
use fingate::{
    api::SessionState,
    auth::{IssuedTokens, RotationMode},
    db::{Database, UserRepository},
    jwt::{JwtConfig, TokenLifetimes, now_secs},
};
use jsonwebtoken::Algorithm;

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-for-testing-only";
pub const ACCESS_TTL_MINUTES: u64 = 15;
pub const REFRESH_TTL_DAYS: u64 = 7;

pub fn test_jwt() -> JwtConfig {
    JwtConfig::new(
        TEST_SECRET,
        Algorithm::HS256,
        TokenLifetimes::from_config(ACCESS_TTL_MINUTES, REFRESH_TTL_DAYS),
    )
}

/// Create a session state backed by a fresh in-memory database.
pub async fn create_test_state(rotation: RotationMode) -> SessionState {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    SessionState {
        db,
        jwt: Arc::new(test_jwt()),
        rotation,
    }
}

/// Create a test app and return (app, state).
pub async fn create_test_app() -> (axum::Router, SessionState) {
    let state = create_test_state(RotationMode::LastWriterWins).await;
    (fingate::router(state.clone()), state)
}

/// Create a user and return its identity.
pub async fn create_user(state: &SessionState, username: &str) -> String {
    let uuid = uuid::Uuid::new_v4().to_string();
    state.db.users().create(&uuid, username).await.unwrap();
    uuid
}

/// Issue a token pair as if the user had logged in `seconds_ago` seconds ago.
pub async fn login_ago(state: &SessionState, identity: &str, seconds_ago: u64) -> IssuedTokens {
    let issued_at = now_secs().unwrap() - seconds_ago;
    let access = state
        .jwt
        .generate_access_token_at(identity, issued_at)
        .unwrap();
    let refresh = state
        .jwt
        .generate_refresh_token_at(identity, issued_at)
        .unwrap();

    state
        .db
        .users()
        .set_refresh_token(identity, Some(&refresh.token))
        .await
        .unwrap();

    IssuedTokens {
        access_token: access.token,
        access_max_age: access.duration,
        refresh_token: refresh.token,
        refresh_max_age: refresh.duration,
    }
}

/// Seconds after which an access token issued at login has expired.
pub fn past_access_ttl() -> u64 {
    ACCESS_TTL_MINUTES * 60 + 60
}

/// Seconds after which a refresh token issued at login has expired.
pub fn past_refresh_ttl() -> u64 {
    REFRESH_TTL_DAYS * 24 * 60 * 60 + 60
}

pub async fn stored_refresh_token(state: &SessionState, identity: &str) -> Option<String> {
    state
        .db
        .users()
        .get_by_uuid(identity)
        .await
        .unwrap()
        .and_then(|u| u.refresh_token)
}

pub fn auth_cookies(access_token: &str, refresh_token: &str) -> String {
    format!(
        "access_token={}; refresh_token={}",
        access_token, refresh_token
    )
}

pub fn access_cookie_only(access_token: &str) -> String {
    format!("access_token={}", access_token)
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value of a cookie being set (not cleared) in the response
pub fn set_cookie_value(cookies: &[String], cookie_name: &str) -> Option<String> {
    let prefix = format!("{}=", cookie_name);
    cookies
        .iter()
        .filter(|c| !c.contains("Max-Age=0"))
        .find_map(|c| c.strip_prefix(&prefix))
        .and_then(|rest| rest.split(';').next())
        .map(|v| v.to_string())
}

/// Check if cookies contain a token being cleared (Max-Age=0)
pub fn has_cleared_cookie(cookies: &[String], cookie_name: &str) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=;", cookie_name)) && c.contains("Max-Age=0"))
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Make every write of a non-NULL refresh token fail.
pub async fn block_rotation_writes(db: &Database) {
    sqlx::query(
        "CREATE TRIGGER block_rotation BEFORE UPDATE OF refresh_token ON users
         WHEN NEW.refresh_token IS NOT NULL
         BEGIN SELECT RAISE(ABORT, 'rotation blocked'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();
}

/// Make every clearing write of the refresh token fail.
pub async fn block_revocation_writes(db: &Database) {
    sqlx::query(
        "CREATE TRIGGER block_revocation BEFORE UPDATE OF refresh_token ON users
         WHEN NEW.refresh_token IS NULL
         BEGIN SELECT RAISE(ABORT, 'revocation blocked'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();
}
