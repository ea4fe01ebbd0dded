// src/domain/models.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Auction lifecycle status.
///
/// `Sold` and `Unsold` are terminal; once an auction reaches either, its
/// record is immutable and its coordinator is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Scheduled,
    AcceptingBid,
    GoingOnce,
    GoingTwice,
    Sold,
    Unsold,
}

impl AuctionStatus {
    /// Bids are allowed during the open phase and both countdown phases.
    pub fn accepts_bids(&self) -> bool {
        matches!(
            self,
            AuctionStatus::AcceptingBid | AuctionStatus::GoingOnce | AuctionStatus::GoingTwice
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionStatus::Sold | AuctionStatus::Unsold)
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuctionStatus::Scheduled => write!(f, "SCHEDULED"),
            AuctionStatus::AcceptingBid => write!(f, "ACCEPTING_BID"),
            AuctionStatus::GoingOnce => write!(f, "GOING_ONCE"),
            AuctionStatus::GoingTwice => write!(f, "GOING_TWICE"),
            AuctionStatus::Sold => write!(f, "SOLD"),
            AuctionStatus::Unsold => write!(f, "UNSOLD"),
        }
    }
}

/// A live auction record.
///
/// `version` is the store concurrency token: every committed write bumps it,
/// and conditional writes (`append_bid`) are rejected when it has moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub starting_price: Decimal,
    pub current_price: Decimal,
    pub bid_count: u32,
    pub status: AuctionStatus,
    pub seller_id: Uuid,
    pub winner_id: Option<Uuid>,
    pub last_bidder_id: Option<Uuid>,
    pub discount_percent: Decimal,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Auction {
    pub fn from_draft(seller_id: Uuid, draft: AuctionDraft) -> Self {
        let status = if draft.open_immediately {
            AuctionStatus::AcceptingBid
        } else {
            AuctionStatus::Scheduled
        };

        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            image_urls: draft.image_urls,
            starting_price: draft.starting_price,
            current_price: draft.starting_price,
            bid_count: 0,
            status,
            seller_id,
            winner_id: None,
            last_bidder_id: None,
            discount_percent: draft.discount_percent,
            category: draft.category,
            created_at: Utc::now(),
            version: 0,
        }
    }
}

/// Seller-supplied fields for a new auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionDraft {
    pub title: String,
    pub description: String,
    pub image_urls: Vec<String>,
    pub starting_price: Decimal,
    pub discount_percent: Decimal,
    pub category: Option<String>,
    /// Open for bidding right away instead of waiting for a manual start.
    pub open_immediately: bool,
}

/// A single accepted bid. Bids form an append-only ledger per auction,
/// strictly increasing in amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub auction_id: Uuid,
    pub bidder_id: Uuid,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl Bid {
    pub fn new(auction_id: Uuid, bidder_id: Uuid, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            auction_id,
            bidder_id,
            amount,
            placed_at: Utc::now(),
        }
    }
}

/// State change fanned out to subscribed clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuctionEvent {
    BidAccepted {
        auction: Auction,
        bid: Bid,
    },
    PhaseChanged {
        auction: Auction,
    },
    Completed {
        auction_id: Uuid,
        status: AuctionStatus,
        winner_id: Option<Uuid>,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> Uuid {
        match self {
            AuctionEvent::BidAccepted { auction, .. } => auction.id,
            AuctionEvent::PhaseChanged { auction } => auction.id,
            AuctionEvent::Completed { auction_id, .. } => *auction_id,
        }
    }
}
