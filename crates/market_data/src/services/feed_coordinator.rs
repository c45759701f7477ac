//! Single point of entry for every write to, and every read of, the ledger.
//!
//! Deltas, the one-off full snapshot, and the periodic reads all go through
//! one coarse `tokio` mutex, so a reader never sees half of a delta. The
//! mutex also guards the startup phase.
//!
//! Startup ordering: the full order book is requested only after the first
//! delta has been applied. Deltas that arrive while the request is in flight
//! are applied as they come, and the snapshot is then merged on top without
//! clearing anything. A level that only a delta created and the snapshot no
//! longer lists stays in the ledger. There are no sequence numbers to
//! reconcile the two sources.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time;
use tracing::{debug, error, info, warn};

use common::error::FeedError;
use common::models::{BookUpdate, MarketSnapshot, Side};
use strategy::StreakSignalEngine;

use crate::ledger::PriceLedger;
use crate::traits::MarketSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Disconnected,
    AwaitingFirstDelta,
    Synchronized,
}

#[derive(Debug)]
struct FeedState {
    ledger: PriceLedger,
    phase: FeedPhase,
}

impl FeedState {
    fn merge(&mut self, update: &BookUpdate) {
        for level in &update.bids {
            self.ledger.upsert(Side::Bid, level.price, level.volume);
        }
        for level in &update.asks {
            self.ledger.upsert(Side::Ask, level.price, level.volume);
        }
    }
}

pub struct FeedCoordinator<S> {
    source: Arc<S>,
    engine: StreakSignalEngine,
    state: Mutex<FeedState>,
    first_delta: watch::Sender<bool>,
    first_delta_timeout: Option<Duration>,
}

impl<S: MarketSource> FeedCoordinator<S> {
    pub fn new(source: Arc<S>, engine: StreakSignalEngine) -> Self {
        let (first_delta, _) = watch::channel(false);
        Self {
            source,
            engine,
            state: Mutex::new(FeedState {
                ledger: PriceLedger::new(),
                phase: FeedPhase::Disconnected,
            }),
            first_delta,
            first_delta_timeout: None,
        }
    }

    /// Bounds the wait for the first delta. `None` waits indefinitely.
    pub fn with_first_delta_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.first_delta_timeout = timeout;
        self
    }

    pub async fn phase(&self) -> FeedPhase {
        self.state.lock().await.phase
    }

    /// Marks the delta subscription as live. Also the reconnect path: the
    /// barrier closes again and the next `synchronize` waits for a new
    /// first delta. Existing levels are kept.
    pub async fn subscribe(&self) {
        let mut state = self.state.lock().await;
        let previous = state.phase;
        state.phase = FeedPhase::AwaitingFirstDelta;
        self.first_delta.send_replace(false);

        info!(from = ?previous, "delta feed subscribed, awaiting first delta");
    }

    /// Applies one delta event. All of its levels become visible at once.
    pub async fn apply_delta(&self, update: &BookUpdate) {
        let mut state = self.state.lock().await;
        state.merge(update);

        debug!(levels = update.level_count(), "delta applied");

        if state.phase == FeedPhase::AwaitingFirstDelta {
            let opened = self.first_delta.send_if_modified(|seen| !std::mem::replace(seen, true));
            if opened {
                info!("first delta applied, order book snapshot may be requested");
            }
        }
    }

    /// Merges a full order book on top of the current levels.
    /// Nothing is cleared first.
    pub async fn apply_snapshot(&self, update: &BookUpdate) {
        let mut state = self.state.lock().await;
        state.merge(update);
        debug!(levels = update.level_count(), "order book snapshot merged");
    }

    /// Waits for the first delta, then fetches and merges the full order book.
    ///
    /// A failed fetch leaves the ledger as it was and the phase at
    /// `AwaitingFirstDelta`; the caller may retry without waiting for another
    /// delta.
    pub async fn synchronize(&self) -> Result<(), FeedError> {
        if self.phase().await == FeedPhase::Synchronized {
            return Ok(());
        }

        self.wait_for_first_delta().await?;

        let update = match self.source.fetch_order_book().await {
            Ok(update) => update,
            Err(e) => {
                error!(error = %e, "order book snapshot fetch failed, keeping current levels");
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        state.merge(&update);
        state.phase = FeedPhase::Synchronized;

        info!(
            bids = state.ledger.len(Side::Bid),
            asks = state.ledger.len(Side::Ask),
            "order book synchronized"
        );
        Ok(())
    }

    /// Reads the top `depth` levels of each side and the signal-augmented
    /// tape as one consistent view.
    ///
    /// The lock is held for the whole read, trade fetch included, so writers
    /// wait until it completes. `2 * depth` trades are requested and the
    /// augmented tape is cut back to `depth`.
    pub async fn snapshot(&self, depth: usize) -> Result<MarketSnapshot, FeedError> {
        let state = self.state.lock().await;

        let bids = state.ledger.top_levels(Side::Bid, depth);
        let asks = state.ledger.top_levels(Side::Ask, depth);

        let tape = match self.source.fetch_trades(trade_window(depth)).await {
            Ok(tape) => tape,
            Err(e) => {
                warn!(error = %e, "trade tape fetch failed, skipping this read");
                return Err(e);
            }
        };

        let mut trades = self.engine.augment(&tape);
        trades.truncate(depth);
        drop(state);

        Ok(MarketSnapshot { bids, asks, trades })
    }

    async fn wait_for_first_delta(&self) -> Result<(), FeedError> {
        let mut rx = self.first_delta.subscribe();
        let opened = rx.wait_for(|seen| *seen);

        let result = match self.first_delta_timeout {
            Some(limit) => time::timeout(limit, opened)
                .await
                .map_err(|_| FeedError::BarrierTimeout(limit))?
                .map(|_| ()),
            None => opened.await.map(|_| ()),
        };

        result.map_err(|_| FeedError::Transport("first delta barrier closed".to_string()))
    }
}

/// Trades requested per read: twice the displayed depth, so synthetic
/// entries can be merged in and the result cut back to `depth`.
fn trade_window(depth: usize) -> usize {
    depth.saturating_mul(2)
}
