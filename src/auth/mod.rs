//! Session authentication for protected API routes.
//!
//! Dual-token system: short-lived access tokens (stateless) and long-lived
//! refresh tokens, of which exactly one per user is stored as "current".
//! An expired access token is renewed through the gate by rotating both
//! tokens; presenting a refresh token that is no longer current revokes the
//! user's session.

mod cookie;
mod errors;
mod extractors;
mod gate;
mod session;
mod state;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, append_cleared_cookies, append_session_cookies,
    cleared_cookie, get_cookie, session_cookie, sets_session_cookie,
};
pub use errors::{ApiAuthError, AuthErrorKind, RepositoryOp, TokenKind};
pub use extractors::Auth;
pub use gate::{Authenticated, authenticate, session_gate};
pub use session::{end_session, issue_tokens, start_session};
pub use state::HasAuthBackend;
pub use types::{AuthenticatedUser, IssuedTokens, RotationMode};
