use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::delete,
};
use tracing::info;

use super::error::{ApiError, ResultExt};
use super::session::SessionState;
use crate::auth::{Auth, append_cleared_cookies};

pub fn router() -> Router<SessionState> {
    Router::new().route("/me", delete(withdraw))
}

/// Withdraw: delete the caller's account, which also drops its session slot.
async fn withdraw(
    State(state): State<SessionState>,
    Auth(user): Auth,
) -> Result<Response, ApiError> {
    let deleted = state
        .db
        .users()
        .delete(user.user_id)
        .await
        .db_err("Failed to delete user")?;

    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    info!(identity = %user.identity, "Account withdrawn");

    let mut response = StatusCode::NO_CONTENT.into_response();
    append_cleared_cookies(response.headers_mut());
    Ok(response)
}
