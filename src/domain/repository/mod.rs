// src/domain/repository/mod.rs
// Repository interfaces for domain entities

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::StoreResult;
use crate::domain::models::{Auction, AuctionStatus, Bid};

/// Repository interface for durable auction and bid records.
///
/// The store is the only shared mutable resource; `append_bid` must be a
/// conditional write so two writers can never both commit against the same
/// snapshot, even in a multi-process deployment.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn load(&self, auction_id: Uuid) -> StoreResult<Auction>;

    async fn create(&self, auction: Auction) -> StoreResult<Auction>;

    /// Atomically append a bid, set `current_price` to its amount and bump
    /// `bid_count`, provided the auction's version still equals
    /// `expected_version`. Fails with `Conflict` otherwise. Replaying an
    /// already-committed bid id is a no-op returning the committed state.
    async fn append_bid(&self, bid: Bid, expected_version: u64) -> StoreResult<(Auction, Bid)>;

    /// Write a status transition. Terminal auctions reject further writes.
    async fn set_status(
        &self,
        auction_id: Uuid,
        status: AuctionStatus,
        winner_id: Option<Uuid>,
    ) -> StoreResult<Auction>;

    /// Full bid ledger for an auction, newest first.
    async fn bid_history(&self, auction_id: Uuid) -> StoreResult<Vec<Bid>>;

    /// All auctions not in a terminal state, for registry recovery.
    async fn live_auctions(&self) -> StoreResult<Vec<Auction>>;
}

/// Repository interface for the authentication collaborator.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve a client token to a user id, or `None` when unauthenticated.
    async fn resolve_bidder(&self, token: &str) -> Option<Uuid>;
}
