// src/domain/errors.rs
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::models::AuctionStatus;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Only the seller may perform this action")]
    NotSeller,

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: AuctionStatus,
        to: AuctionStatus,
    },

    #[error("Invalid auction: {0}")]
    InvalidAuction(String),

    #[error("Auction coordinator is no longer running")]
    CoordinatorGone,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Rejection reasons for a submitted bid. Always surfaced to the caller,
/// never retried; the auction state is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Bid must be higher than the current price ({current})")]
    BidTooLow { current: Decimal },

    #[error("You cannot bid on your own auction")]
    SelfBid,

    #[error("Auction is not accepting bids (status: {status})")]
    NotAcceptingBids { status: AuctionStatus },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Auction not found")]
    NotFound,

    #[error("Concurrent write invalidated the read snapshot")]
    Conflict,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type BidResult<T> = Result<T, ValidationError>;
