//! Relay server
//!
//! Binds the listener and serves the Axum router, either in the background
//! (`listen`) or until a shutdown signal arrives (`run`).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::config::{RelayConfig, ServerConfig};
use crate::error::RelayResult;

/// HTTP + WebSocket relay server
pub struct RelayServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl RelayServer {
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Build the server and its state from a full configuration
    pub fn from_config(config: &RelayConfig) -> RelayResult<Self> {
        let state = AppState::from_config(config)?;
        Ok(Self::new(config.server.clone(), Arc::new(state)))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state), &self.config.static_dir)
    }

    /// Bind and serve in a background task. Returns the bound address.
    pub async fn listen(&self) -> RelayResult<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        let addr = listener.local_addr()?;
        let router = self.router();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = %e, "server stopped");
            }
        });

        info!(%addr, "relay listening");
        Ok((addr, handle))
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> RelayResult<()> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        let addr = listener.local_addr()?;
        info!(
            %addr,
            static_dir = %self.config.static_dir.display(),
            "Server running on port {}",
            addr.port()
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
