//! Live Relay Server - Binary Entry Point

use live_relay::{RelayConfig, RelayResult, RelayServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> RelayResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RelayConfig::from_env()?;
    tracing::info!(
        version = live_relay::VERSION,
        groups = config.registration.group_ids.len(),
        users_per_group = config.registration.users_per_group,
        "starting relay"
    );

    RelayServer::from_config(&config)?.run().await
}
