//! Session gate middleware for protected routes.
//!
//! Each request walks one path through the two-token protocol:
//!
//! 1. No access token cookie: 401, nothing else is touched.
//! 2. Valid access token: look the user up and call through.
//! 3. Expired access token: fall back to the refresh token, which must be
//!    valid, unexpired and equal to the user's stored current token. A match
//!    rotates both tokens; a mismatch revokes the stored token.
//!
//! At most one repository read and one write happen per request.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use super::cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, append_session_cookies, get_cookie,
    sets_session_cookie,
};
use super::errors::{ApiAuthError, AuthErrorKind, RepositoryOp, TokenKind};
use super::session::issue_tokens;
use super::state::HasAuthBackend;
use super::types::{AuthenticatedUser, IssuedTokens, RotationMode};
use crate::db::{User, UserRepository};
use crate::jwt::JwtConfig;

/// Successful outcome of the protocol.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: AuthenticatedUser,
    /// New token pair when the request went through a rotation
    pub issued: Option<IssuedTokens>,
}

/// Middleware that authenticates the request before calling `next`.
///
/// On success the `AuthenticatedUser` is inserted into request extensions and,
/// if the tokens were rotated, both new cookies are appended to the response
/// unless the handler already set or cleared the session cookies itself.
pub async fn session_gate<S>(State(state): State<S>, mut request: Request, next: Next) -> Response
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    let users = state.users();
    let outcome = authenticate(
        request.headers(),
        state.jwt(),
        &users,
        state.rotation_mode(),
    )
    .await;

    match outcome {
        Ok(Authenticated { user, issued }) => {
            request.extensions_mut().insert(user);
            let mut response = next.run(request).await;
            // A handler that set the session cookies itself (logout, withdraw) has the last word
            if let Some(tokens) = issued {
                if !sets_session_cookie(response.headers()) {
                    append_session_cookies(response.headers_mut(), &tokens);
                }
            }
            response
        }
        Err(kind) => ApiAuthError::from(kind).into_response(),
    }
}

/// Run the authentication protocol against the request's cookies.
pub async fn authenticate<U>(
    headers: &HeaderMap,
    jwt: &JwtConfig,
    users: &U,
    rotation: RotationMode,
) -> Result<Authenticated, AuthErrorKind>
where
    U: UserRepository,
{
    let access_token =
        get_cookie(headers, ACCESS_COOKIE_NAME).ok_or(AuthErrorKind::CredentialMissing)?;

    match jwt.validate_access_token(access_token) {
        Ok(claims) => {
            let user = load_user(users, &claims.sub).await?;
            debug!(identity = %claims.sub, "Access token accepted");
            return Ok(Authenticated {
                user: user.into(),
                issued: None,
            });
        }
        Err(e) if e.is_expired() => {}
        Err(e) => {
            error!(error = %e, "Rejected access token");
            return Err(AuthErrorKind::CredentialMalformed(TokenKind::Access));
        }
    }

    let presented =
        get_cookie(headers, REFRESH_COOKIE_NAME).ok_or(AuthErrorKind::RefreshMissing)?;

    let claims = jwt.validate_refresh_token(presented).map_err(|e| {
        if e.is_expired() {
            warn!("Refresh token expired");
            AuthErrorKind::CredentialExpired(TokenKind::Refresh)
        } else {
            error!(error = %e, "Rejected refresh token");
            AuthErrorKind::CredentialMalformed(TokenKind::Refresh)
        }
    })?;

    let user = load_user(users, &claims.sub).await?;

    if user.refresh_token.as_deref() != Some(presented) {
        warn!(identity = %user.uuid, "Refresh token reuse detected, revoking session");
        users
            .set_refresh_token(&user.uuid, None)
            .await
            .map_err(|e| {
                error!(identity = %user.uuid, error = %e, "Failed to revoke session");
                AuthErrorKind::RepositoryFailure(RepositoryOp::Write)
            })?;
        return Err(AuthErrorKind::CredentialMismatch);
    }

    let tokens = issue_tokens(jwt, &user.uuid).map_err(|e| {
        error!(identity = %user.uuid, error = %e, "Failed to mint rotated tokens");
        AuthErrorKind::RotationFailed
    })?;

    let stored = match rotation {
        RotationMode::LastWriterWins => {
            users
                .set_refresh_token(&user.uuid, Some(&tokens.refresh_token))
                .await
        }
        RotationMode::CompareAndSwap => {
            users
                .swap_refresh_token(&user.uuid, presented, &tokens.refresh_token)
                .await
        }
    }
    .map_err(|e| {
        error!(identity = %user.uuid, error = %e, "Failed to store rotated refresh token");
        AuthErrorKind::RotationFailed
    })?;

    if !stored {
        return Err(match rotation {
            RotationMode::CompareAndSwap => {
                warn!(identity = %user.uuid, "Refresh token was rotated concurrently");
                AuthErrorKind::RotationConflict
            }
            // The row disappeared between the read and the write
            RotationMode::LastWriterWins => AuthErrorKind::UserNotFound,
        });
    }

    debug!(identity = %user.uuid, "Rotated session tokens");
    Ok(Authenticated {
        user: user.into(),
        issued: Some(tokens),
    })
}

async fn load_user<U: UserRepository>(users: &U, identity: &str) -> Result<User, AuthErrorKind> {
    users
        .get_by_uuid(identity)
        .await
        .map_err(|e| {
            error!(identity = %identity, error = %e, "Failed to get user");
            AuthErrorKind::RepositoryFailure(RepositoryOp::Read)
        })?
        .ok_or_else(|| {
            warn!(identity = %identity, "Token subject has no user record");
            AuthErrorKind::UserNotFound
        })
}
