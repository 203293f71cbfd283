//! CLI argument parsing, validation, and startup helpers.
//!
//! Signing secret, algorithm and both token lifetimes are required; the
//! process refuses to start without them.

use crate::ServerConfig;
use crate::auth::RotationMode;
use crate::db::Database;
use crate::jwt::{TokenLifetimes, parse_algorithm};
use clap::Parser;
use jsonwebtoken::Algorithm;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;
/// One year
const MAX_ACCESS_TTL_MINUTES: u64 = 365 * 24 * 60;
/// Ten years
const MAX_REFRESH_TTL_DAYS: u64 = 10 * 365;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "fingate",
    about = "Session authentication gate for the financial data API"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7291")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "fingate.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// JWT signing algorithm (HS256, HS384 or HS512)
    #[arg(long, env = "JWT_ALGORITHM", value_parser = validate_algorithm)]
    pub jwt_algorithm: Algorithm,

    /// Access token lifetime in minutes
    #[arg(
        long,
        env = "ACCESS_TOKEN_TTL_MINUTES",
        value_parser = clap::value_parser!(u64).range(1..=MAX_ACCESS_TTL_MINUTES)
    )]
    pub access_ttl_minutes: u64,

    /// Refresh token lifetime in days
    #[arg(
        long,
        env = "REFRESH_TOKEN_TTL_DAYS",
        value_parser = clap::value_parser!(u64).range(1..=MAX_REFRESH_TTL_DAYS)
    )]
    pub refresh_ttl_days: u64,

    /// Only rotate a refresh token if it is still the stored one (rejects concurrent rotations
    /// instead of letting the last write win)
    #[arg(long)]
    pub strict_rotation: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_algorithm(s: &str) -> Result<Algorithm, String> {
    parse_algorithm(s).map_err(|e| e.to_string())
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    validate_secret(secret)
}

fn validate_secret(secret: String) -> Option<String> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, jwt_secret: String) -> ServerConfig {
    let rotation = if args.strict_rotation {
        RotationMode::CompareAndSwap
    } else {
        RotationMode::LastWriterWins
    };

    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        jwt_algorithm: args.jwt_algorithm,
        lifetimes: TokenLifetimes::from_config(args.access_ttl_minutes, args.refresh_ttl_days),
        rotation,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
