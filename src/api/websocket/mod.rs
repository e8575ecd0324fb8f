//! WebSocket signaling endpoint
//!
//! Served at `/ws` and `/api/ws`. Each socket is split into a reader loop
//! that routes frames through the registry and a writer task that drains
//! the connection's outbound queue and sends heartbeat pings.

pub mod handler;

pub use handler::ws_handler;
