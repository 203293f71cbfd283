//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::cookie::append_cleared_cookies;

/// Which of the two credentials an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Which repository call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryOp {
    Read,
    Write,
}

/// Internal auth error kind used by the core authentication logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No access token cookie
    CredentialMissing,
    /// Access token expired and no refresh token cookie
    RefreshMissing,
    CredentialExpired(TokenKind),
    /// Valid refresh token that is not the stored current one (reuse suspected)
    CredentialMismatch,
    /// Another request rotated the same refresh token first
    RotationConflict,
    /// Bad signature, undecodable, or wrong token type
    CredentialMalformed(TokenKind),
    UserNotFound,
    RepositoryFailure(RepositoryOp),
    /// The rotated refresh token could not be minted or persisted
    RotationFailed,
    /// A login token pair could not be minted
    TokenIssue,
}

/// API authentication errors (returns JSON `{"message"}`).
///
/// Credential problems are 401s and also clear both cookies; everything else
/// is a 500 and leaves the cookies in place.
#[derive(Debug)]
pub struct ApiAuthError {
    pub(super) kind: AuthErrorKind,
}

impl ApiAuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::CredentialMissing
            | AuthErrorKind::CredentialExpired(_)
            | AuthErrorKind::CredentialMismatch
            | AuthErrorKind::RotationConflict => StatusCode::UNAUTHORIZED,
            AuthErrorKind::RefreshMissing
            | AuthErrorKind::CredentialMalformed(_)
            | AuthErrorKind::UserNotFound
            | AuthErrorKind::RepositoryFailure(_)
            | AuthErrorKind::RotationFailed
            | AuthErrorKind::TokenIssue => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::CredentialMissing => "Unauthorized",
            // Access expiry alone is never surfaced; only the refresh token's is
            AuthErrorKind::CredentialExpired(_) => "TOKEN EXPIRED",
            AuthErrorKind::CredentialMismatch => "invalid refresh token. please login again",
            AuthErrorKind::RotationConflict => {
                "invalid refresh token (superseded by concurrent rotation)"
            }
            AuthErrorKind::UserNotFound => "UNEXPECTED ERROR (USER NOT FOUND)",
            AuthErrorKind::RotationFailed => "UNEXPECTED ERROR (RTR FAILED)",
            AuthErrorKind::RefreshMissing
            | AuthErrorKind::CredentialMalformed(_)
            | AuthErrorKind::RepositoryFailure(_)
            | AuthErrorKind::TokenIssue => "UNEXPECTED ERROR",
        }
    }
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self::new(kind)
    }
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?})", self.message(), self.kind)
    }
}

impl std::error::Error for ApiAuthError {}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: &'static str,
        }

        let status = self.status_code();
        let mut response = (
            status,
            Json(ErrorResponse {
                message: self.message(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            append_cleared_cookies(response.headers_mut());
        }

        response
    }
}
