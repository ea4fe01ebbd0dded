// src/auction/coordinator.rs
// Per-auction authority: serializes bids, owns the phase countdown.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use uuid::Uuid;

use crate::auction::broadcaster::EventBroadcaster;
use crate::config::AuctionConfig;
use crate::domain::errors::{AppError, AppResult, StoreError};
use crate::domain::models::{Auction, AuctionEvent, AuctionStatus, Bid};
use crate::domain::repository::AuctionStore;
use crate::domain::validator::validate_bid;

enum Command {
    PlaceBid {
        bidder_id: Uuid,
        amount: Decimal,
        reply: oneshot::Sender<AppResult<(Auction, Bid)>>,
    },
    Start {
        caller_id: Uuid,
        reply: oneshot::Sender<AppResult<Auction>>,
    },
    ForceClose {
        caller_id: Uuid,
        status: AuctionStatus,
        reply: oneshot::Sender<AppResult<Auction>>,
    },
    Snapshot {
        reply: oneshot::Sender<Auction>,
    },
    TimerFired {
        generation: u64,
    },
}

/// Client side of a coordinator's mailbox. Cloneable; all state changes for
/// the auction funnel through the single task behind it.
#[derive(Clone)]
pub struct CoordinatorHandle {
    auction_id: Uuid,
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    pub fn auction_id(&self) -> Uuid {
        self.auction_id
    }

    pub async fn place_bid(&self, bidder_id: Uuid, amount: Decimal) -> AppResult<(Auction, Bid)> {
        self.request(|reply| Command::PlaceBid {
            bidder_id,
            amount,
            reply,
        })
        .await?
    }

    /// Manual SCHEDULED -> ACCEPTING_BID transition by the seller.
    pub async fn start(&self, caller_id: Uuid) -> AppResult<Auction> {
        self.request(|reply| Command::Start { caller_id, reply }).await?
    }

    /// Seller override forcing a terminal status, bypassing the countdown.
    pub async fn force_close(&self, caller_id: Uuid, status: AuctionStatus) -> AppResult<Auction> {
        self.request(|reply| Command::ForceClose {
            caller_id,
            status,
            reply,
        })
        .await?
    }

    /// The coordinator's current view of the auction.
    pub async fn snapshot(&self) -> AppResult<Auction> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> AppResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| AppError::CoordinatorGone)?;
        reply_rx.await.map_err(|_| AppError::CoordinatorGone)
    }
}

/// Spawn the actor task for one live auction and return its handle.
pub fn spawn(
    auction: Auction,
    store: Arc<dyn AuctionStore>,
    broadcaster: Arc<dyn EventBroadcaster>,
    config: AuctionConfig,
    retired_tx: mpsc::Sender<Uuid>,
) -> CoordinatorHandle {
    let (tx, rx) = mpsc::channel(config.mailbox_capacity);
    let auction_id = auction.id;

    let coordinator = AuctionCoordinator {
        auction,
        store,
        broadcaster,
        config,
        generation: 0,
        self_tx: tx.clone(),
        retired_tx,
    };
    tokio::spawn(coordinator.run(rx));

    CoordinatorHandle { auction_id, tx }
}

struct AuctionCoordinator {
    auction: Auction,
    store: Arc<dyn AuctionStore>,
    broadcaster: Arc<dyn EventBroadcaster>,
    config: AuctionConfig,
    /// Bumped on every (re)arm; a timer fire carrying an older generation
    /// is stale and must be ignored.
    generation: u64,
    self_tx: mpsc::Sender<Command>,
    retired_tx: mpsc::Sender<Uuid>,
}

impl AuctionCoordinator {
    async fn run(mut self, mut inbox: mpsc::Receiver<Command>) {
        log::info!(
            "Coordinator for auction {} started ({})",
            self.auction.id,
            self.auction.status
        );

        // Rehydration mid-countdown restarts the interrupted phase's
        // countdown from the beginning; the original deadline is not
        // persisted, and restarting cannot close the auction early.
        match self.auction.status {
            AuctionStatus::GoingOnce | AuctionStatus::GoingTwice => self.arm_timer(),
            AuctionStatus::AcceptingBid if self.auction.bid_count > 0 => self.arm_timer(),
            _ => {}
        }

        while let Some(cmd) = inbox.recv().await {
            match cmd {
                Command::PlaceBid {
                    bidder_id,
                    amount,
                    reply,
                } => {
                    let result = self.handle_place_bid(bidder_id, amount).await;
                    let _ = reply.send(result);
                }
                Command::Start { caller_id, reply } => {
                    let result = self.handle_start(caller_id).await;
                    let _ = reply.send(result);
                }
                Command::ForceClose {
                    caller_id,
                    status,
                    reply,
                } => {
                    let result = self.handle_force_close(caller_id, status).await;
                    let _ = reply.send(result);
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.auction.clone());
                }
                Command::TimerFired { generation } => {
                    self.handle_timer_fired(generation).await;
                }
            }

            if self.auction.status.is_terminal() {
                break;
            }
        }

        inbox.close();
        log::info!(
            "Coordinator for auction {} retired ({})",
            self.auction.id,
            self.auction.status
        );
        let _ = self.retired_tx.send(self.auction.id).await;
    }

    async fn handle_place_bid(
        &mut self,
        bidder_id: Uuid,
        amount: Decimal,
    ) -> AppResult<(Auction, Bid)> {
        validate_bid(&self.auction, amount, bidder_id)?;

        let bid = Bid::new(self.auction.id, bidder_id, amount);
        let (auction, bid) = match self.store.append_bid(bid.clone(), self.auction.version).await {
            Ok(committed) => committed,
            Err(StoreError::Conflict) => {
                // An interleaving write beat us to the store. Re-validate
                // against the fresh state once; a second failure is
                // surfaced, never silently dropped.
                self.auction = self.store.load(self.auction.id).await?;
                validate_bid(&self.auction, amount, bidder_id)?;
                match self.store.append_bid(bid, self.auction.version).await {
                    Ok(committed) => committed,
                    Err(StoreError::Conflict) => {
                        self.auction = self.store.load(self.auction.id).await?;
                        validate_bid(&self.auction, amount, bidder_id)?;
                        return Err(StoreError::Conflict.into());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        // A bid during a countdown always wins: drop back to ACCEPTING_BID
        // and invalidate the in-flight advance.
        let was_countdown = matches!(
            auction.status,
            AuctionStatus::GoingOnce | AuctionStatus::GoingTwice
        );
        self.auction = if was_countdown {
            match self
                .store
                .set_status(auction.id, AuctionStatus::AcceptingBid, None)
                .await
            {
                Ok(reset) => reset,
                Err(e) => {
                    // The bid is committed but the phase reset is not; absorb
                    // the committed state, keep the countdown alive and
                    // surface the store failure. Price, count and last bidder
                    // must track the store or a later SOLD would crown the
                    // wrong winner.
                    log::warn!(
                        "Auction {}: failed to reset phase after bid: {}",
                        auction.id,
                        e
                    );
                    self.auction = auction;
                    self.arm_timer();
                    return Err(e.into());
                }
            }
        } else {
            auction
        };

        self.arm_timer();

        log::info!(
            "Auction {}: bid {} by {} accepted (count {})",
            self.auction.id,
            bid.amount,
            bid.bidder_id,
            self.auction.bid_count
        );
        self.broadcaster.publish(AuctionEvent::BidAccepted {
            auction: self.auction.clone(),
            bid: bid.clone(),
        });
        if was_countdown {
            self.broadcaster.publish(AuctionEvent::PhaseChanged {
                auction: self.auction.clone(),
            });
        }

        Ok((self.auction.clone(), bid))
    }

    async fn handle_start(&mut self, caller_id: Uuid) -> AppResult<Auction> {
        if caller_id != self.auction.seller_id {
            return Err(AppError::NotSeller);
        }

        match self.auction.status {
            AuctionStatus::Scheduled => {
                self.auction = self
                    .store
                    .set_status(self.auction.id, AuctionStatus::AcceptingBid, None)
                    .await?;
                log::info!("Auction {} opened for bidding", self.auction.id);
                self.broadcaster.publish(AuctionEvent::PhaseChanged {
                    auction: self.auction.clone(),
                });
                // No timer until the first bid; the auction waits
                // indefinitely in ACCEPTING_BID.
                if self.auction.bid_count > 0 {
                    self.arm_timer();
                }
                Ok(self.auction.clone())
            }
            status if status.accepts_bids() => Ok(self.auction.clone()),
            status => Err(AppError::InvalidTransition {
                from: status,
                to: AuctionStatus::AcceptingBid,
            }),
        }
    }

    async fn handle_force_close(
        &mut self,
        caller_id: Uuid,
        status: AuctionStatus,
    ) -> AppResult<Auction> {
        if caller_id != self.auction.seller_id {
            return Err(AppError::NotSeller);
        }
        if !status.is_terminal() || self.auction.status.is_terminal() {
            return Err(AppError::InvalidTransition {
                from: self.auction.status,
                to: status,
            });
        }

        let winner_id = if status == AuctionStatus::Sold {
            match self.auction.last_bidder_id {
                Some(winner) => Some(winner),
                None => {
                    return Err(AppError::InvalidAuction(
                        "an auction with no bids cannot be marked SOLD".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        // Fence out any countdown still in flight.
        self.generation += 1;

        self.auction = self.store.set_status(self.auction.id, status, winner_id).await?;
        log::info!("Auction {} force-closed as {}", self.auction.id, status);
        self.broadcaster.publish(AuctionEvent::PhaseChanged {
            auction: self.auction.clone(),
        });
        self.broadcaster.publish(AuctionEvent::Completed {
            auction_id: self.auction.id,
            status: self.auction.status,
            winner_id: self.auction.winner_id,
        });

        Ok(self.auction.clone())
    }

    async fn handle_timer_fired(&mut self, generation: u64) {
        if generation != self.generation {
            log::debug!(
                "Auction {}: dropping stale timer fire (generation {} != {})",
                self.auction.id,
                generation,
                self.generation
            );
            return;
        }

        let next = match self.auction.status {
            AuctionStatus::AcceptingBid if self.auction.bid_count > 0 => AuctionStatus::GoingOnce,
            AuctionStatus::GoingOnce => AuctionStatus::GoingTwice,
            AuctionStatus::GoingTwice => {
                if self.auction.bid_count > 0 {
                    AuctionStatus::Sold
                } else {
                    AuctionStatus::Unsold
                }
            }
            _ => return,
        };

        self.advance_phase(next).await;
    }

    async fn advance_phase(&mut self, next: AuctionStatus) {
        let winner_id = if next == AuctionStatus::Sold {
            self.auction.last_bidder_id
        } else {
            None
        };

        let mut attempt = 0u32;
        let auction = loop {
            match self.store.set_status(self.auction.id, next, winner_id).await {
                Ok(auction) => break auction,
                Err(e) => {
                    attempt += 1;
                    if attempt > self.config.advance_retries {
                        log::warn!(
                            "Auction {}: advance to {} failed after {} attempts: {}",
                            self.auction.id,
                            next,
                            attempt,
                            e
                        );
                        self.revert_to_accepting().await;
                        return;
                    }
                    log::warn!(
                        "Auction {}: advance to {} failed (attempt {}): {}; retrying",
                        self.auction.id,
                        next,
                        attempt,
                        e
                    );
                    sleep(self.config.advance_backoff() * attempt).await;
                }
            }
        };

        self.auction = auction;
        log::info!("Auction {} is now {}", self.auction.id, self.auction.status);
        self.broadcaster.publish(AuctionEvent::PhaseChanged {
            auction: self.auction.clone(),
        });

        if self.auction.status.is_terminal() {
            self.broadcaster.publish(AuctionEvent::Completed {
                auction_id: self.auction.id,
                status: self.auction.status,
                winner_id: self.auction.winner_id,
            });
        } else {
            self.arm_timer();
        }
    }

    /// Fallback when an automatic advance cannot be persisted: the auction
    /// must not sit in GOING_ONCE/GOING_TWICE forever, so drop back to
    /// ACCEPTING_BID and start a fresh countdown.
    async fn revert_to_accepting(&mut self) {
        match self
            .store
            .set_status(self.auction.id, AuctionStatus::AcceptingBid, None)
            .await
        {
            Ok(auction) => {
                self.auction = auction;
                self.broadcaster.publish(AuctionEvent::PhaseChanged {
                    auction: self.auction.clone(),
                });
            }
            Err(e) => {
                log::error!(
                    "Auction {}: failed to revert to ACCEPTING_BID: {}",
                    self.auction.id,
                    e
                );
            }
        }
        self.arm_timer();
    }

    /// Schedule the next quiet-period expiry. Each arm invalidates every
    /// previously scheduled fire via the generation fence, so a reset never
    /// races an old countdown.
    fn arm_timer(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let quiet_period = self.config.quiet_period();
        let tx = self.self_tx.clone();

        tokio::spawn(async move {
            sleep(quiet_period).await;
            // The mailbox is gone once the coordinator retires.
            let _ = tx.send(Command::TimerFired { generation }).await;
        });
    }
}
