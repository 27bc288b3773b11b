//! Scalper State - shared terminal state
//!
//! Every object here is written by exactly one task (the event router) and
//! read concurrently by the command and render tasks. Each object carries its
//! own lock; no operation holds two of them at once.
//!
//! ## Layout
//!
//! ```text
//!                 ┌───────────────────── SharedState ─────────────────────┐
//!                 │                                                       │
//!  executions ──► │  MarketState (spot)      MarketState (margin)         │
//!                 │        │ LTP                    │ LTP                 │
//!                 │        └──────────┬─────────────┘                     │
//!                 │                   ▼                                   │
//!                 │           PremiumEstimator (margin / spot)            │
//!                 │                                                       │
//!  order events ► │  OrderLedger (spot)      OrderLedger (margin)         │
//!                 └───────────────────────────────────────────────────────┘
//!
//!  command / render tasks ──► LogBuffer (operator activity log)
//! ```

pub mod log_buffer;
pub mod market_state;
pub mod order_ledger;
pub mod premium;

pub use log_buffer::LogBuffer;
pub use market_state::{MarketSnapshot, MarketState};
pub use order_ledger::{Exposure, LedgerChange, OrderLedger, TrackedOrder};
pub use premium::PremiumEstimator;

use scalper_core::Market;
use scalper_ports::Clock;
use std::sync::Arc;

/// Handles to every shared state object
///
/// Cloning is cheap; clones point at the same objects.
#[derive(Clone)]
pub struct SharedState {
    pub spot: Arc<MarketState>,
    pub margin: Arc<MarketState>,
    pub spot_orders: Arc<OrderLedger>,
    pub margin_orders: Arc<OrderLedger>,
    pub premium: Arc<PremiumEstimator>,
}

impl SharedState {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            spot: Arc::new(MarketState::new(Market::Spot, clock.clone())),
            margin: Arc::new(MarketState::new(Market::Margin, clock)),
            spot_orders: Arc::new(OrderLedger::new(Market::Spot)),
            margin_orders: Arc::new(OrderLedger::new(Market::Margin)),
            premium: Arc::new(PremiumEstimator::new()),
        }
    }

    pub fn market(&self, market: Market) -> &Arc<MarketState> {
        match market {
            Market::Spot => &self.spot,
            Market::Margin => &self.margin,
        }
    }

    pub fn orders(&self, market: Market) -> &Arc<OrderLedger> {
        match market {
            Market::Spot => &self.spot_orders,
            Market::Margin => &self.margin_orders,
        }
    }

    /// Recompute the premium from both markets' latest prices
    pub fn recompute_premium(&self) -> Option<rust_decimal::Decimal> {
        self.premium.recompute_from(&self.spot, &self.margin)
    }
}
