//! HTTP server setup with Axum

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use super::rest::{health, registration};
use super::state::AppState;
use super::websocket::ws_handler;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    // CORS configuration - allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Signaling sockets
        .route("/ws", get(ws_handler))
        .route("/api/ws", get(ws_handler))
        // Health check
        .route("/health", get(health::health_check))
        // Registration
        .route("/api/register", post(registration::register))
        .route("/api/login", post(registration::login))
        .route("/api/me", get(registration::me))
        .route("/api/groups", get(registration::groups))
        // Everything else is a static file
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(state)
}
