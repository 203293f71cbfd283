//! JWT token generation and validation.
//!
//! Access tokens are stateless and only checked for signature and expiry.
//! Refresh tokens carry a random nonce so that two tokens minted in the same
//! second for the same identity still differ; the session gate compares them
//! textually against the stored current value.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token, never compared against stored state
    Access,
    /// Long-lived refresh token, compared against the user's stored slot
    Refresh,
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user identity)
    pub sub: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user identity)
    pub sub: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Random per-issuance value
    pub nonce: String,
}

/// How long each token type stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access_secs: u64,
    pub refresh_secs: u64,
}

impl TokenLifetimes {
    /// Build lifetimes from the configured units (minutes for access, days for refresh).
    /// Values too large to express in seconds saturate; issuing a token with
    /// such a lifetime fails with `JwtError::LifetimeOverflow`.
    pub fn from_config(access_minutes: u64, refresh_days: u64) -> Self {
        Self {
            access_secs: access_minutes.saturating_mul(60),
            refresh_secs: refresh_days.saturating_mul(24 * 60 * 60),
        }
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetimes: TokenLifetimes,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Result of generating a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenResult {
    /// The JWT token string
    pub token: String,
    /// Nonce embedded in the claims
    pub nonce: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

/// Parse a configured algorithm name. Only shared-secret (HMAC) algorithms are accepted.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, JwtError> {
    let algorithm = Algorithm::from_str(name.trim())
        .map_err(|_| JwtError::UnsupportedAlgorithm(name.to_string()))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        _ => Err(JwtError::UnsupportedAlgorithm(name.to_string())),
    }
}

fn expiry(issued_at: u64, duration: u64) -> Result<u64, JwtError> {
    issued_at
        .checked_add(duration)
        .ok_or(JwtError::LifetimeOverflow)
}

/// Current Unix time in seconds.
pub fn now_secs() -> Result<u64, JwtError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| JwtError::TimeError)
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret, algorithm and lifetimes.
    pub fn new(secret: &[u8], algorithm: Algorithm, lifetimes: TokenLifetimes) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetimes,
        }
    }

    pub fn lifetimes(&self) -> TokenLifetimes {
        self.lifetimes
    }

    /// Generate an access token for a user, issued now.
    pub fn generate_access_token(&self, identity: &str) -> Result<AccessTokenResult, JwtError> {
        self.generate_access_token_at(identity, now_secs()?)
    }

    /// Generate an access token with an explicit issue time.
    pub fn generate_access_token_at(
        &self,
        identity: &str,
        issued_at: u64,
    ) -> Result<AccessTokenResult, JwtError> {
        let duration = self.lifetimes.access_secs;

        let claims = AccessClaims {
            sub: identity.to_string(),
            token_type: TokenType::Access,
            iat: issued_at,
            exp: expiry(issued_at, duration)?,
        };

        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(AccessTokenResult { token, duration })
    }

    /// Generate a refresh token for a user, issued now.
    pub fn generate_refresh_token(&self, identity: &str) -> Result<RefreshTokenResult, JwtError> {
        self.generate_refresh_token_at(identity, now_secs()?)
    }

    /// Generate a refresh token with an explicit issue time.
    pub fn generate_refresh_token_at(
        &self,
        identity: &str,
        issued_at: u64,
    ) -> Result<RefreshTokenResult, JwtError> {
        let duration = self.lifetimes.refresh_secs;
        let nonce = uuid::Uuid::new_v4().to_string();
        let exp = expiry(issued_at, duration)?;

        let claims = RefreshClaims {
            sub: identity.to_string(),
            token_type: TokenType::Refresh,
            iat: issued_at,
            exp,
            nonce: nonce.clone(),
        };

        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(RefreshTokenResult {
            token,
            nonce,
            expires_at: exp,
            duration,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let token_data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation())
                .map_err(JwtError::from)?;

        if token_data.claims.token_type != TokenType::Access {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let token_data =
            jsonwebtoken::decode::<RefreshClaims>(token, &self.decoding_key, &self.validation())
                .map_err(JwtError::from)?;

        if token_data.claims.token_type != TokenType::Refresh {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Signature did not verify against the configured secret
    InvalidSignature,
    /// Token could not be decoded or is missing required claims
    Malformed(jsonwebtoken::errors::Error),
    /// Signature is valid but the token is past its expiry
    Expired,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
    /// Algorithm name is unknown or not a shared-secret algorithm
    UnsupportedAlgorithm(String),
    /// System time error
    TimeError,
    /// Issue time plus lifetime does not fit in a timestamp
    LifetimeOverflow,
}

impl JwtError {
    pub fn is_expired(&self) -> bool {
        matches!(self, JwtError::Expired)
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Malformed(e),
        }
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::InvalidSignature => write!(f, "Invalid token signature"),
            JwtError::Malformed(e) => write!(f, "Malformed token: {}", e),
            JwtError::Expired => write!(f, "Token expired"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
            JwtError::UnsupportedAlgorithm(name) => {
                write!(f, "Unsupported signing algorithm: {}", name)
            }
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::LifetimeOverflow => write!(f, "Token lifetime overflows expiry timestamp"),
        }
    }
}

impl std::error::Error for JwtError {}
