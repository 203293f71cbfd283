//! Session endpoints.
//!
//! - GET `/` - Identity of the current caller
//! - POST `/logout` - Clear the stored refresh token and both cookies

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{Auth, RotationMode, append_cleared_cookies, end_session};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct SessionState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub rotation: RotationMode,
}

impl_has_auth_backend!(SessionState);

pub fn router() -> Router<SessionState> {
    Router::new()
        .route("/", get(current_session))
        .route("/logout", post(logout))
}

#[derive(Serialize)]
struct SessionResponse {
    identity: String,
    username: String,
}

/// Return the caller's identity. Also serves as a cheap "am I logged in" probe.
async fn current_session(Auth(user): Auth) -> impl IntoResponse {
    Json(SessionResponse {
        identity: user.identity,
        username: user.username,
    })
}

/// Logout: revoke the stored refresh token and clear both cookies.
async fn logout(
    State(state): State<SessionState>,
    Auth(user): Auth,
) -> Result<Response, ApiError> {
    end_session(&state, &user.identity)
        .await
        .db_err("Failed to end session")?;

    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true })),
    )
        .into_response();
    append_cleared_cookies(response.headers_mut());
    Ok(response)
}
