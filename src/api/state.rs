//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use crate::config::RelayConfig;
use crate::error::RelayResult;
use crate::registration::{RegistrationStore, SessionIssuer};
use crate::signaling::ConnectionRegistry;

/// State shared by every HTTP and WebSocket handler
pub struct AppState {
    /// Open signaling connections and the broadcaster slot
    pub registry: Arc<ConnectionRegistry>,

    /// Registered users and group counts
    pub registrations: Arc<RegistrationStore>,

    /// Login token issuer
    pub sessions: Arc<SessionIssuer>,

    /// Interval between server-initiated WebSocket pings
    pub heartbeat_interval: Duration,
}

impl AppState {
    pub fn new(
        registrations: RegistrationStore,
        sessions: SessionIssuer,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            registrations: Arc::new(registrations),
            sessions: Arc::new(sessions),
            heartbeat_interval,
        }
    }

    pub fn from_config(config: &RelayConfig) -> RelayResult<Self> {
        let registrations = RegistrationStore::from_config(&config.registration);
        let sessions = SessionIssuer::from_config(&config.registration)?;
        Ok(Self::new(
            registrations,
            sessions,
            config.server.heartbeat_interval(),
        ))
    }
}
