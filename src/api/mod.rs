//! Status API subsystem.
//!
//! # Data Flow
//! ```text
//! GET /api/v1/status
//!     → TraceLayer
//!     → auth.rs (HTTP Basic, canary credentials)
//!     → handlers.rs (reads StateHandle)
//!     → {"healthy": bool}
//! ```
//!
//! # Design Decisions
//! - The handler only reads the shared atomic; it never blocks on the coal miner
//! - TLS is optional and uses inline PEM from config

pub mod auth;
pub mod handlers;
pub mod server;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::health::StateHandle;

pub use auth::BasicCredentials;
pub use server::{bind, load_tls_config, serve};

pub const STATUS_PATH: &str = "/api/v1/status";

/// Router serving the cluster status behind Basic auth.
pub fn status_router(state: StateHandle, credentials: BasicCredentials) -> Router {
    Router::new()
        .route(STATUS_PATH, get(handlers::get_status))
        .layer(middleware::from_fn_with_state(credentials, auth::basic_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
