//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::types::AuthenticatedUser;

/// Extractor for handlers behind the session gate.
/// Reads the `AuthenticatedUser` the gate stored in request extensions;
/// a route mounted without the gate always rejects with 401.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiAuthError::new(AuthErrorKind::CredentialMissing))
    }
}
