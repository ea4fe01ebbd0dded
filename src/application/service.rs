// src/application/service.rs
// Facade consumed by the transport layer: authentication plus routing into
// the per-auction coordinators.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auction::broadcaster::EventBroadcaster;
use crate::auction::registry::AuctionRegistry;
use crate::domain::errors::{AppError, AppResult, ValidationError};
use crate::domain::models::{Auction, AuctionDraft, AuctionEvent, AuctionStatus, Bid};
use crate::domain::repository::{AuctionStore, Authenticator};

pub struct AuctionService {
    store: Arc<dyn AuctionStore>,
    auth: Arc<dyn Authenticator>,
    registry: Arc<AuctionRegistry>,
    broadcaster: Arc<dyn EventBroadcaster>,
}

impl AuctionService {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        auth: Arc<dyn Authenticator>,
        registry: Arc<AuctionRegistry>,
        broadcaster: Arc<dyn EventBroadcaster>,
    ) -> Self {
        Self {
            store,
            auth,
            registry,
            broadcaster,
        }
    }

    /// Persist a new auction for the authenticated seller.
    pub async fn create_auction(&self, token: &str, draft: AuctionDraft) -> AppResult<Auction> {
        let seller_id = self.resolve(token).await?;

        if draft.starting_price < Decimal::ZERO {
            return Err(AppError::InvalidAuction(
                "starting price must not be negative".to_string(),
            ));
        }
        if draft.discount_percent < Decimal::ZERO || draft.discount_percent > Decimal::ONE_HUNDRED {
            return Err(AppError::InvalidAuction(
                "discount must be between 0 and 100".to_string(),
            ));
        }
        if draft.title.trim().is_empty() {
            return Err(AppError::InvalidAuction("title is required".to_string()));
        }

        let auction = Auction::from_draft(seller_id, draft);
        Ok(self.store.create(auction).await?)
    }

    /// Submit a bid on behalf of the token's user.
    pub async fn place_bid(
        &self,
        token: &str,
        auction_id: Uuid,
        amount: Decimal,
    ) -> AppResult<(Auction, Bid)> {
        let bidder_id = self.resolve(token).await?;

        match self.registry.get_or_create(auction_id).await {
            Ok(handle) => match handle.place_bid(bidder_id, amount).await {
                Err(AppError::CoordinatorGone) => self.reject_closed(auction_id).await,
                other => other,
            },
            // The auction completed; report its terminal status rather
            // than a transport error.
            Err(AppError::CoordinatorGone) => self.reject_closed(auction_id).await,
            Err(e) => Err(e),
        }
    }

    /// Seller's manual "start": SCHEDULED -> ACCEPTING_BID.
    pub async fn start_auction(&self, token: &str, auction_id: Uuid) -> AppResult<Auction> {
        let caller_id = self.resolve(token).await?;
        let handle = self.registry.get_or_create(auction_id).await?;
        handle.start(caller_id).await
    }

    /// Seller's administrative override to a terminal status.
    pub async fn close_auction(
        &self,
        token: &str,
        auction_id: Uuid,
        status: AuctionStatus,
    ) -> AppResult<Auction> {
        let caller_id = self.resolve(token).await?;
        let handle = self.registry.get_or_create(auction_id).await?;
        handle.force_close(caller_id, status).await
    }

    pub async fn get_auction(&self, auction_id: Uuid) -> AppResult<Auction> {
        Ok(self.store.load(auction_id).await?)
    }

    pub async fn bid_history(&self, auction_id: Uuid) -> AppResult<Vec<Bid>> {
        Ok(self.store.bid_history(auction_id).await?)
    }

    pub fn subscribe(&self, auction_id: Uuid) -> broadcast::Receiver<AuctionEvent> {
        self.broadcaster.subscribe(auction_id)
    }

    async fn resolve(&self, token: &str) -> AppResult<Uuid> {
        self.auth
            .resolve_bidder(token)
            .await
            .ok_or(AppError::Unauthenticated)
    }

    async fn reject_closed<T>(&self, auction_id: Uuid) -> AppResult<T> {
        let auction = self.store.load(auction_id).await?;
        Err(ValidationError::NotAcceptingBids {
            status: auction.status,
        }
        .into())
    }
}
