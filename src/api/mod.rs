//! API module for HTTP and WebSocket endpoints
//!
//! Serves the signaling socket, the registration REST API and the static
//! front-end files.

pub mod http;
pub mod rest;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use state::AppState;
