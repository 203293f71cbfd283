//! Authentication user types.

use crate::db::User;

/// Caller identity resolved by the session gate.
/// Inserted into request extensions for downstream handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Database user ID
    pub user_id: i64,
    /// Stable user identity (the token subject)
    pub identity: String,
    pub username: String,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            identity: user.uuid,
            username: user.username,
        }
    }
}

/// A freshly minted access/refresh pair, ready to be set as cookies.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    /// Access cookie lifetime in seconds
    pub access_max_age: u64,
    pub refresh_token: String,
    /// Refresh cookie lifetime in seconds
    pub refresh_max_age: u64,
}

/// How a rotation writes the new refresh token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationMode {
    /// Unconditional overwrite. Concurrent rotations race and the last write wins.
    #[default]
    LastWriterWins,
    /// Conditional write keyed on the presented token.
    CompareAndSwap,
}
