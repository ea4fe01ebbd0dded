// src/infrastructure/memory/mod.rs
// In-memory auction store with versioned conditional writes

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{Auction, AuctionStatus, Bid};
use crate::domain::repository::AuctionStore;

struct AuctionRecord {
    auction: Auction,
    bids: Vec<Bid>,
}

/// Hash-map backed store. The per-auction `version` counter makes
/// `append_bid` a compare-and-swap: a writer holding a stale snapshot gets
/// `Conflict` and must re-read.
pub struct InMemoryAuctionStore {
    records: Arc<RwLock<HashMap<Uuid, AuctionRecord>>>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryAuctionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn load(&self, auction_id: Uuid) -> StoreResult<Auction> {
        let records = self.records.read().await;
        records
            .get(&auction_id)
            .map(|r| r.auction.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, auction: Auction) -> StoreResult<Auction> {
        let mut records = self.records.write().await;
        if records.contains_key(&auction.id) {
            return Err(StoreError::Conflict);
        }

        records.insert(
            auction.id,
            AuctionRecord {
                auction: auction.clone(),
                bids: Vec::new(),
            },
        );

        Ok(auction)
    }

    async fn append_bid(&self, bid: Bid, expected_version: u64) -> StoreResult<(Auction, Bid)> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&bid.auction_id).ok_or(StoreError::NotFound)?;

        // Replaying an already-committed bid id must not double-increment.
        if let Some(existing) = record.bids.iter().find(|b| b.id == bid.id) {
            return Ok((record.auction.clone(), existing.clone()));
        }

        if record.auction.version != expected_version {
            return Err(StoreError::Conflict);
        }

        record.auction.current_price = bid.amount;
        record.auction.bid_count += 1;
        record.auction.last_bidder_id = Some(bid.bidder_id);
        record.auction.version += 1;
        record.bids.push(bid.clone());

        Ok((record.auction.clone(), bid))
    }

    async fn set_status(
        &self,
        auction_id: Uuid,
        status: AuctionStatus,
        winner_id: Option<Uuid>,
    ) -> StoreResult<Auction> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&auction_id).ok_or(StoreError::NotFound)?;

        // Terminal records are immutable.
        if record.auction.status.is_terminal() {
            return Err(StoreError::Conflict);
        }

        record.auction.status = status;
        if status == AuctionStatus::Sold {
            record.auction.winner_id = winner_id;
        }
        record.auction.version += 1;

        Ok(record.auction.clone())
    }

    async fn bid_history(&self, auction_id: Uuid) -> StoreResult<Vec<Bid>> {
        let records = self.records.read().await;
        let record = records.get(&auction_id).ok_or(StoreError::NotFound)?;

        let mut bids = record.bids.clone();
        bids.reverse(); // newest first
        Ok(bids)
    }

    async fn live_auctions(&self) -> StoreResult<Vec<Auction>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| !r.auction.status.is_terminal())
            .map(|r| r.auction.clone())
            .collect())
    }
}
