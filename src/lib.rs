//! Live Relay
//!
//! A one-broadcaster/many-viewer WebRTC signaling relay, plus a small group
//! registration service, served over a single Axum HTTP server.
//!
//! # Features
//!
//! - **Single broadcaster**: admission is serialized under one lock; a second
//!   claimant is told `Broadcaster already exists` and closed
//! - **Verbatim relay**: offer/answer/candidate payloads are never rewritten
//! - **Stream status**: viewers learn `isLive` on join and on every change
//! - **First-fit groups**: registrations fill configured groups in order
//! - **Reconnecting client**: capped fixed or linear back-off
//!
//! # Modules
//!
//! - `signaling`: message types, connection registry, message router
//! - `registration`: group allocator, user store, session tokens
//! - `api`: Axum router, REST handlers, WebSocket handler
//! - `server`: listener setup and graceful shutdown
//! - `client`: WebSocket signaling client
//! - `config`: environment configuration
//!
//! # Example
//!
//! ```no_run
//! use live_relay::{RelayConfig, RelayServer};
//!
//! #[tokio::main]
//! async fn main() -> live_relay::RelayResult<()> {
//!     let config = RelayConfig::from_env()?;
//!     RelayServer::from_config(&config)?.run().await
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod registration;
pub mod server;
pub mod signaling;

// Re-export commonly used items at crate root
pub use api::AppState;
pub use client::{ClientError, ReconnectPolicy, SignalingClient};
pub use config::{ConfigError, RegistrationConfig, RelayConfig, ServerConfig};
pub use error::{RelayError, RelayResult};
pub use registration::{GroupAllocator, RegistrationStore, SessionIssuer, UserRecord};
pub use server::RelayServer;
pub use signaling::{ConnectionRegistry, ServerMessage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
