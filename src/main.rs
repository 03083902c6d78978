use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use duel_registry::config::ServerConfig;
use duel_registry::registry::Registry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Duel Registry v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: admin={}:{}, max_players={}, max_matches={}",
        config.bind_address,
        config.admin_port,
        config.registry.max_players,
        config.registry.max_matches
    );

    // Single registry instance, shared with every collaborator
    let registry = Arc::new(Registry::new(config.registry.clone()));

    #[cfg(feature = "admin")]
    {
        let addr = std::net::SocketAddr::new(config.bind_address, config.admin_port);
        let registry = registry.clone();
        tokio::spawn(async move {
            if let Err(e) = duel_registry::metrics::start_admin_server(registry, addr).await {
                error!("Admin server error: {}", e);
            }
        });
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");

    info!(
        "Registry stopped with {} players and {} matches",
        registry.player_count(),
        registry.match_count()
    );

    Ok(())
}
