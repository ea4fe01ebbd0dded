// src/domain/validator.rs
// Pure bid validation, no side effects.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::errors::{BidResult, ValidationError};
use crate::domain::models::Auction;

/// Decide whether a proposed bid is acceptable against the given auction
/// state. Checks run in a fixed order: phase, self-bid, amount.
pub fn validate_bid(auction: &Auction, amount: Decimal, bidder_id: Uuid) -> BidResult<()> {
    if !auction.status.accepts_bids() {
        return Err(ValidationError::NotAcceptingBids {
            status: auction.status,
        });
    }

    if bidder_id == auction.seller_id {
        return Err(ValidationError::SelfBid);
    }

    if amount <= auction.current_price {
        return Err(ValidationError::BidTooLow {
            current: auction.current_price,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AuctionDraft, AuctionStatus};
    use rust_decimal_macros::dec;

    fn fixture(status: AuctionStatus) -> Auction {
        let mut auction = Auction::from_draft(
            Uuid::new_v4(),
            AuctionDraft {
                title: "Vintage radio".to_string(),
                description: "Still works".to_string(),
                image_urls: vec![],
                starting_price: dec!(20),
                discount_percent: dec!(0),
                category: None,
                open_immediately: true,
            },
        );
        auction.status = status;
        auction
    }

    #[test]
    fn accepts_higher_bid_in_open_phase() {
        let auction = fixture(AuctionStatus::AcceptingBid);
        assert!(validate_bid(&auction, dec!(25), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn accepts_bids_during_countdown_phases() {
        for status in [AuctionStatus::GoingOnce, AuctionStatus::GoingTwice] {
            let auction = fixture(status);
            assert!(validate_bid(&auction, dec!(21), Uuid::new_v4()).is_ok());
        }
    }

    #[test]
    fn rejects_when_not_accepting() {
        for status in [
            AuctionStatus::Scheduled,
            AuctionStatus::Sold,
            AuctionStatus::Unsold,
        ] {
            let auction = fixture(status);
            assert_eq!(
                validate_bid(&auction, dec!(100), Uuid::new_v4()),
                Err(ValidationError::NotAcceptingBids { status }),
            );
        }
    }

    #[test]
    fn rejects_seller_bidding_on_own_auction() {
        let auction = fixture(AuctionStatus::AcceptingBid);
        assert_eq!(
            validate_bid(&auction, dec!(25), auction.seller_id),
            Err(ValidationError::SelfBid),
        );
    }

    #[test]
    fn rejects_bid_at_or_below_current_price() {
        let auction = fixture(AuctionStatus::AcceptingBid);
        for amount in [dec!(19.99), dec!(20)] {
            assert_eq!(
                validate_bid(&auction, amount, Uuid::new_v4()),
                Err(ValidationError::BidTooLow { current: dec!(20) }),
            );
        }
    }

    #[test]
    fn phase_check_runs_before_amount_check() {
        // A too-low bid on a closed auction reports the phase problem first.
        let auction = fixture(AuctionStatus::Sold);
        assert_eq!(
            validate_bid(&auction, dec!(1), Uuid::new_v4()),
            Err(ValidationError::NotAcceptingBids {
                status: AuctionStatus::Sold
            }),
        );
    }
}
