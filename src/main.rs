// src/main.rs
use std::sync::Arc;

use tokio::signal::ctrl_c;

use live_auction::auction::broadcaster::ChannelBroadcaster;
use live_auction::auction::registry::AuctionRegistry;
use live_auction::config::Config;
use live_auction::domain::errors::AppResult;
use live_auction::infrastructure::memory::InMemoryAuctionStore;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting live_auction v{}", env!("CARGO_PKG_VERSION"));
    log::info!(
        "Quiet period: {}s, advance retries: {}",
        config.auction.quiet_period_secs,
        config.auction.advance_retries
    );

    // Wire the engine: store, broadcaster, registry
    let store = Arc::new(InMemoryAuctionStore::new());
    let broadcaster = Arc::new(ChannelBroadcaster::new(config.events.channel_capacity));
    let registry = AuctionRegistry::new(store.clone(), broadcaster.clone(), config.auction.clone());

    // Rehydrate coordinators for any auction that was live at shutdown
    let recovered = registry.recover().await?;
    log::info!("Recovered {} live auction(s)", recovered);

    // Wait for shutdown signal
    log::info!("Auction engine is running. Press Ctrl+C to stop.");
    ctrl_c().await.expect("Failed to listen for control-c event");

    log::info!("Shutting down...");
    log::info!(
        "{} auction(s) still live at shutdown",
        registry.live_count().await
    );

    log::info!("Shutdown complete. Goodbye!");
    Ok(())
}
