pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;

use api::{SessionState, create_api_router};
use auth::RotationMode;
use axum::Router;
use db::Database;
use jsonwebtoken::Algorithm;
use jwt::{JwtConfig, TokenLifetimes};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Signing algorithm (HMAC family)
    pub jwt_algorithm: Algorithm,
    /// Access and refresh token lifetimes
    pub lifetimes: TokenLifetimes,
    /// How refresh token rotation is persisted
    pub rotation: RotationMode,
}

impl ServerConfig {
    /// Build the shared state used by the session gate and handlers.
    pub fn session_state(&self) -> SessionState {
        SessionState {
            db: self.db.clone(),
            jwt: Arc::new(JwtConfig::new(
                &self.jwt_secret,
                self.jwt_algorithm,
                self.lifetimes,
            )),
            rotation: self.rotation,
        }
    }
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    router(config.session_state())
}

/// Create the application router around an existing session state.
pub fn router(state: SessionState) -> Router {
    Router::new().nest("/api", create_api_router(state))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
