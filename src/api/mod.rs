mod error;
mod session;
mod users;

use axum::{Router, middleware};

use crate::auth::session_gate;

pub use error::ApiError;
pub use session::SessionState;

/// Create the API router. Every route sits behind the session gate.
pub fn create_api_router(state: SessionState) -> Router {
    Router::new()
        .nest("/session", session::router())
        .nest("/users", users::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_gate::<SessionState>,
        ))
        .with_state(state)
}
