// src/auction/registry.rs
// Owns the set of live coordinators: one per auction, created lazily,
// retired on completion.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::auction::broadcaster::EventBroadcaster;
use crate::auction::coordinator::{self, CoordinatorHandle};
use crate::config::AuctionConfig;
use crate::domain::errors::{AppError, AppResult};
use crate::domain::repository::AuctionStore;

pub struct AuctionRegistry {
    store: Arc<dyn AuctionStore>,
    broadcaster: Arc<dyn EventBroadcaster>,
    config: AuctionConfig,
    live: Mutex<HashMap<Uuid, CoordinatorHandle>>,
    retired_tx: mpsc::Sender<Uuid>,
}

impl AuctionRegistry {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        broadcaster: Arc<dyn EventBroadcaster>,
        config: AuctionConfig,
    ) -> Arc<Self> {
        let (retired_tx, mut retired_rx) = mpsc::channel(64);

        let registry = Arc::new(Self {
            store,
            broadcaster,
            config,
            live: Mutex::new(HashMap::new()),
            retired_tx,
        });

        // Reap coordinators as they reach a terminal state so the map does
        // not grow with completed auctions.
        let weak = Arc::downgrade(&registry);
        tokio::spawn(async move {
            while let Some(auction_id) = retired_rx.recv().await {
                match weak.upgrade() {
                    Some(registry) => registry.retire(auction_id).await,
                    None => break,
                }
            }
        });

        registry
    }

    /// Hand out the coordinator for a live auction, spawning it on first
    /// activity. The map lock is the single point guaranteeing one
    /// coordinator per auction id.
    pub async fn get_or_create(&self, auction_id: Uuid) -> AppResult<CoordinatorHandle> {
        let mut live = self.live.lock().await;
        if let Some(handle) = live.get(&auction_id) {
            return Ok(handle.clone());
        }

        let auction = self.store.load(auction_id).await?;
        if auction.status.is_terminal() {
            // Completed auctions are plain store reads; no coordinator.
            return Err(AppError::CoordinatorGone);
        }

        let handle = coordinator::spawn(
            auction,
            self.store.clone(),
            self.broadcaster.clone(),
            self.config.clone(),
            self.retired_tx.clone(),
        );
        live.insert(auction_id, handle.clone());

        Ok(handle)
    }

    pub async fn retire(&self, auction_id: Uuid) {
        let mut live = self.live.lock().await;
        if live.remove(&auction_id).is_some() {
            log::info!("Auction {} removed from registry", auction_id);
        }
    }

    /// Rehydrate a coordinator for every non-terminal auction after a
    /// process restart. Auctions found mid-countdown restart that phase's
    /// countdown from the beginning.
    pub async fn recover(&self) -> AppResult<usize> {
        let auctions = self.store.live_auctions().await?;
        let mut live = self.live.lock().await;
        let mut recovered = 0;

        for auction in auctions {
            if live.contains_key(&auction.id) {
                continue;
            }
            let auction_id = auction.id;
            let handle = coordinator::spawn(
                auction,
                self.store.clone(),
                self.broadcaster.clone(),
                self.config.clone(),
                self.retired_tx.clone(),
            );
            live.insert(auction_id, handle);
            recovered += 1;
        }

        Ok(recovered)
    }

    pub async fn live_count(&self) -> usize {
        self.live.lock().await.len()
    }
}
