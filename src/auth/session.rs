//! Session lifecycle: issuing a token pair at login and ending it at logout.
//!
//! Login itself (password or otherwise) happens before `start_session` is
//! called; this module only manages the session for an already validated
//! identity.

use tracing::{error, info};

use super::errors::{AuthErrorKind, RepositoryOp};
use super::state::HasAuthBackend;
use super::types::IssuedTokens;
use crate::db::UserRepository;
use crate::jwt::{JwtConfig, JwtError};

/// Mint a new access/refresh pair for `identity`.
pub fn issue_tokens(jwt: &JwtConfig, identity: &str) -> Result<IssuedTokens, JwtError> {
    let access = jwt.generate_access_token(identity)?;
    let refresh = jwt.generate_refresh_token(identity)?;

    Ok(IssuedTokens {
        access_token: access.token,
        access_max_age: access.duration,
        refresh_token: refresh.token,
        refresh_max_age: refresh.duration,
    })
}

/// Start a session for a validated identity.
///
/// The new refresh token overwrites whatever was stored, so any session the
/// user had elsewhere stops being refreshable.
pub async fn start_session<S>(state: &S, identity: &str) -> Result<IssuedTokens, AuthErrorKind>
where
    S: HasAuthBackend,
{
    let users = state.users();

    users
        .get_by_uuid(identity)
        .await
        .map_err(|e| {
            error!(identity = %identity, error = %e, "Failed to get user");
            AuthErrorKind::RepositoryFailure(RepositoryOp::Read)
        })?
        .ok_or(AuthErrorKind::UserNotFound)?;

    let tokens = issue_tokens(state.jwt(), identity).map_err(|e| {
        error!(identity = %identity, error = %e, "Failed to issue tokens");
        AuthErrorKind::TokenIssue
    })?;

    let stored = users
        .set_refresh_token(identity, Some(&tokens.refresh_token))
        .await
        .map_err(|e| {
            error!(identity = %identity, error = %e, "Failed to store refresh token");
            AuthErrorKind::RepositoryFailure(RepositoryOp::Write)
        })?;

    if !stored {
        return Err(AuthErrorKind::UserNotFound);
    }

    info!(identity = %identity, "Session started");
    Ok(tokens)
}

/// End the session for `identity` by clearing its stored refresh token.
/// Returns false if the user no longer exists.
pub async fn end_session<S>(state: &S, identity: &str) -> Result<bool, sqlx::Error>
where
    S: HasAuthBackend,
{
    let cleared = state.users().set_refresh_token(identity, None).await?;
    if cleared {
        info!(identity = %identity, "Session ended");
    }
    Ok(cleared)
}
