// src/auction/broadcaster.rs
// Event fan-out to subscribed clients

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::models::AuctionEvent;

/// Fan-out seam between coordinators and the client transport. Injected as
/// a capability so tests can substitute their own sink.
pub trait EventBroadcaster: Send + Sync {
    /// Deliver an event to every current subscriber of its auction.
    /// Best-effort, at-most-once per connection; per-auction order matches
    /// publish order.
    fn publish(&self, event: AuctionEvent);

    /// Open a subscription for one auction's events. A reconnecting client
    /// gets no replay and must fetch fresh state from the store.
    fn subscribe(&self, auction_id: Uuid) -> broadcast::Receiver<AuctionEvent>;
}

/// Broadcaster backed by one `tokio::sync::broadcast` channel per auction,
/// created lazily and dropped after the completion event.
pub struct ChannelBroadcaster {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<AuctionEvent>>>,
    capacity: usize,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }
}

impl EventBroadcaster for ChannelBroadcaster {
    fn publish(&self, event: AuctionEvent) {
        let auction_id = event.auction_id();
        let completed = matches!(event, AuctionEvent::Completed { .. });

        let mut channels = self.channels.lock().unwrap();
        if let Some(sender) = channels.get(&auction_id) {
            // A send error only means there are no live subscribers.
            if sender.send(event).is_err() {
                log::debug!("No subscribers for auction {}", auction_id);
            }
        }

        if completed {
            channels.remove(&auction_id);
        }
    }

    fn subscribe(&self, auction_id: Uuid) -> broadcast::Receiver<AuctionEvent> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(auction_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Auction, AuctionDraft, AuctionStatus};
    use rust_decimal_macros::dec;

    fn sample_auction() -> Auction {
        Auction::from_draft(
            Uuid::new_v4(),
            AuctionDraft {
                title: "Bookshelf".to_string(),
                description: "Solid oak".to_string(),
                image_urls: vec![],
                starting_price: dec!(5),
                discount_percent: dec!(0),
                category: None,
                open_immediately: true,
            },
        )
    }

    #[tokio::test]
    async fn delivers_events_in_publish_order() {
        let broadcaster = ChannelBroadcaster::new(16);
        let auction = sample_auction();
        let mut rx = broadcaster.subscribe(auction.id);

        for status in [AuctionStatus::GoingOnce, AuctionStatus::GoingTwice] {
            let mut snapshot = auction.clone();
            snapshot.status = status;
            broadcaster.publish(AuctionEvent::PhaseChanged { auction: snapshot });
        }

        for expected in [AuctionStatus::GoingOnce, AuctionStatus::GoingTwice] {
            match rx.recv().await.unwrap() {
                AuctionEvent::PhaseChanged { auction } => assert_eq!(auction.status, expected),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let broadcaster = ChannelBroadcaster::new(16);
        broadcaster.publish(AuctionEvent::Completed {
            auction_id: Uuid::new_v4(),
            status: AuctionStatus::Unsold,
            winner_id: None,
        });
    }

    #[tokio::test]
    async fn completion_drops_the_channel() {
        let broadcaster = ChannelBroadcaster::new(16);
        let auction_id = Uuid::new_v4();
        let mut rx = broadcaster.subscribe(auction_id);

        broadcaster.publish(AuctionEvent::Completed {
            auction_id,
            status: AuctionStatus::Sold,
            winner_id: Some(Uuid::new_v4()),
        });

        // The completion event itself is still delivered...
        assert!(rx.recv().await.is_ok());
        // ...then the channel closes.
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
