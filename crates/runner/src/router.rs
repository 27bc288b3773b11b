//! Event router
//!
//! Single consumer of the merged feed and the only writer of shared state.
//! Each event mutates exactly one market state or order ledger; execution
//! batches additionally refresh the premium ratio.

use log::{debug, info};
use scalper_core::Market;
use scalper_gateway::{FeedEvent, FeedPayload, Subscriber};
use scalper_state::{LedgerChange, SharedState};
use tokio_util::sync::CancellationToken;

/// Counters kept by the router
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub spot_batches: u64,
    pub margin_batches: u64,
    pub spot_order_events: u64,
    pub margin_order_events: u64,
    /// Batches with no prints; they change nothing
    pub empty_batches: u64,
    pub premium_updates: u64,
}

impl RouterStats {
    pub fn total(&self) -> u64 {
        self.spot_batches
            + self.margin_batches
            + self.spot_order_events
            + self.margin_order_events
            + self.empty_batches
    }
}

pub struct EventRouter {
    state: SharedState,
    stats: RouterStats,
}

impl EventRouter {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            stats: RouterStats::default(),
        }
    }

    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    /// Apply one event to the shared state
    pub fn route(&mut self, event: &FeedEvent) {
        match &event.payload {
            FeedPayload::Executions(batch) => {
                if !self.state.market(event.market).apply_executions(batch) {
                    self.stats.empty_batches += 1;
                    return;
                }
                match event.market {
                    Market::Spot => self.stats.spot_batches += 1,
                    Market::Margin => self.stats.margin_batches += 1,
                }
                if self.state.recompute_premium().is_some() {
                    self.stats.premium_updates += 1;
                }
                debug!("{} executions: {} prints", event.market, batch.prints.len());
            }
            FeedPayload::OrderStatus(order_event) => {
                let change = self.state.orders(event.market).apply(order_event);
                match event.market {
                    Market::Spot => self.stats.spot_order_events += 1,
                    Market::Margin => self.stats.margin_order_events += 1,
                }
                if change == LedgerChange::Unchanged {
                    debug!(
                        "{} order event for {} left the ledger unchanged",
                        event.market, order_event.order_id
                    );
                } else {
                    debug!("{} order {}: {:?}", event.market, order_event.order_id, change);
                }
            }
        }
    }

    /// Route events until shutdown or until every publisher is gone
    ///
    /// Once the token fires no further event is applied.
    pub async fn run<S>(mut self, mut subscriber: S, shutdown: CancellationToken) -> RouterStats
    where
        S: Subscriber<FeedEvent>,
    {
        info!("Event router started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = subscriber.next() => match next {
                    Ok(event) => self.route(&event),
                    Err(e) => {
                        info!("Feed ended: {}", e);
                        break;
                    }
                },
            }
        }

        info!("Event router stopped: {:?}", self.stats);
        self.stats
    }
}
