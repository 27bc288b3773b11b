//! Per-market rolling state
//!
//! One `MarketState` exists for each market. The event router is its only
//! writer; the command and render tasks take point-in-time snapshots. All
//! fields live behind one lock so a snapshot never mixes two updates.

use chrono::Duration;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use scalper_core::{Market, Price, Quantity, Timestamp};
use scalper_gateway::ExecutionBatch;
use scalper_ports::Clock;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct Fields {
    last_trade_price: Price,
    best_bid: Price,
    best_ask: Price,
    volume: Quantity,
    buy_volume: Quantity,
    sell_volume: Quantity,
    updated_at: Option<Timestamp>,
    feed_latency: Option<Duration>,
}

/// Consistent copy of a market's state
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub market: Market,
    pub last_trade_price: Price,
    pub best_bid: Price,
    pub best_ask: Price,
    /// Total traded size since the last reset
    pub volume_since_reset: Quantity,
    /// Buy-taker share of `volume_since_reset`
    pub buy_volume: Quantity,
    /// Sell-taker share of `volume_since_reset`
    pub sell_volume: Quantity,
    pub updated_at: Option<Timestamp>,
    /// Time since the last execution update; `None` before the first one
    pub age: Option<Duration>,
    /// Receipt time minus exchange time of the last print
    pub feed_latency: Option<Duration>,
}

impl MarketSnapshot {
    /// Ask minus bid. May be negative, the execution-derived top can invert.
    pub fn spread(&self) -> Price {
        self.best_ask - self.best_bid
    }

    pub fn has_traded(&self) -> bool {
        self.updated_at.is_some()
    }
}

/// Thread-safe rolling state for one market
pub struct MarketState {
    market: Market,
    clock: Arc<dyn Clock>,
    fields: RwLock<Fields>,
}

impl MarketState {
    /// Zero-valued state, as at startup
    pub fn new(market: Market, clock: Arc<dyn Clock>) -> Self {
        Self {
            market,
            clock,
            fields: RwLock::new(Fields::default()),
        }
    }

    pub fn market(&self) -> Market {
        self.market
    }

    /// Fold an execution batch into the state
    ///
    /// The last print sets the LTP. The latest sell-taker print sets the bid
    /// and the latest buy-taker print sets the ask; a side absent from the
    /// batch keeps its previous value. Returns `false` for an empty batch,
    /// which changes nothing.
    pub fn apply_executions(&self, batch: &ExecutionBatch) -> bool {
        let Some(last_price) = batch.last_price() else {
            return false;
        };
        let (total, buy, sell) = batch.volumes();
        let (bid, ask) = batch.implied_top();
        let now = self.clock.now();
        let latency = batch.last_executed_at().map(|at| now - at);

        let mut fields = self.fields.write();
        fields.last_trade_price = last_price;
        if let Some(bid) = bid {
            fields.best_bid = bid;
        }
        if let Some(ask) = ask {
            fields.best_ask = ask;
        }
        fields.volume += total;
        fields.buy_volume += buy;
        fields.sell_volume += sell;
        fields.updated_at = Some(now);
        if latency.is_some() {
            fields.feed_latency = latency;
        }
        true
    }

    /// Point-in-time copy with `age` measured against the clock
    ///
    /// The clock is read under the lock, and `age` never goes below zero.
    pub fn snapshot(&self) -> MarketSnapshot {
        let (fields, now) = {
            let guard = self.fields.read();
            (guard.clone(), self.clock.now())
        };
        MarketSnapshot {
            market: self.market,
            last_trade_price: fields.last_trade_price,
            best_bid: fields.best_bid,
            best_ask: fields.best_ask,
            volume_since_reset: fields.volume,
            buy_volume: fields.buy_volume,
            sell_volume: fields.sell_volume,
            updated_at: fields.updated_at,
            age: fields.updated_at.map(|at| (now - at).max(Duration::zero())),
            feed_latency: fields.feed_latency,
        }
    }

    pub fn last_trade_price(&self) -> Price {
        self.fields.read().last_trade_price
    }

    /// Best bid and ask read together
    pub fn top_of_book(&self) -> (Price, Price) {
        let fields = self.fields.read();
        (fields.best_bid, fields.best_ask)
    }

    /// Zero the volume accumulators
    pub fn reset_volume(&self) {
        let mut fields = self.fields.write();
        fields.volume = Decimal::ZERO;
        fields.buy_volume = Decimal::ZERO;
        fields.sell_volume = Decimal::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use scalper_clock::ManualClock;
    use scalper_core::Side;
    use scalper_gateway::TradePrint;

    fn state() -> (Arc<ManualClock>, MarketState) {
        let clock = Arc::new(ManualClock::starting_now());
        let state = MarketState::new(Market::Margin, clock.clone());
        (clock, state)
    }

    #[test]
    fn test_starts_zeroed() {
        let (_, state) = state();
        let snap = state.snapshot();
        assert_eq!(snap.last_trade_price, Decimal::ZERO);
        assert_eq!(snap.volume_since_reset, Decimal::ZERO);
        assert_eq!(snap.age, None);
        assert!(!snap.has_traded());
    }

    #[test]
    fn test_ltp_is_last_print_and_volume_accumulates() {
        let (_, state) = state();
        state.apply_executions(&ExecutionBatch::new(vec![
            TradePrint::new(dec!(100), dec!(0.1)),
            TradePrint::new(dec!(101), dec!(0.2)),
        ]));
        state.apply_executions(&ExecutionBatch::new(vec![
            TradePrint::new(dec!(103), dec!(0.3)),
            TradePrint::new(dec!(99), dec!(0.4)),
        ]));

        let snap = state.snapshot();
        assert_eq!(snap.last_trade_price, dec!(99));
        assert_eq!(snap.volume_since_reset, dec!(1.0));
    }

    #[test]
    fn test_top_of_book_keeps_absent_side() {
        let (_, state) = state();
        state.apply_executions(&ExecutionBatch::new(vec![
            TradePrint::sided(Side::Sell, dec!(99), dec!(1)),
            TradePrint::sided(Side::Buy, dec!(101), dec!(1)),
        ]));
        state.apply_executions(&ExecutionBatch::new(vec![TradePrint::sided(
            Side::Sell,
            dec!(98),
            dec!(1),
        )]));

        assert_eq!(state.top_of_book(), (dec!(98), dec!(101)));
        let snap = state.snapshot();
        assert_eq!(snap.spread(), dec!(3));
        assert_eq!(snap.buy_volume, dec!(1));
        assert_eq!(snap.sell_volume, dec!(2));
    }

    #[test]
    fn test_inverted_top_is_tolerated() {
        let (_, state) = state();
        state.apply_executions(&ExecutionBatch::new(vec![
            TradePrint::sided(Side::Buy, dec!(100), dec!(1)),
            TradePrint::sided(Side::Sell, dec!(102), dec!(1)),
        ]));
        let snap = state.snapshot();
        assert_eq!((snap.best_bid, snap.best_ask), (dec!(102), dec!(100)));
        assert_eq!(snap.spread(), dec!(-2));
    }

    #[test]
    fn test_empty_batch_is_ignored() {
        let (_, state) = state();
        assert!(!state.apply_executions(&ExecutionBatch::default()));
        assert!(!state.snapshot().has_traded());
    }

    #[test]
    fn test_age_and_latency_follow_clock() {
        let (clock, state) = state();
        let sent = clock.now() - Duration::milliseconds(40);
        state.apply_executions(&ExecutionBatch::new(vec![
            TradePrint::new(dec!(100), dec!(1)).with_executed_at(sent),
        ]));
        clock.advance(Duration::seconds(3));

        let snap = state.snapshot();
        assert_eq!(snap.age, Some(Duration::seconds(3)));
        assert_eq!(snap.feed_latency, Some(Duration::milliseconds(40)));
    }

    #[test]
    fn test_age_is_never_negative() {
        let (clock, state) = state();
        state.apply_executions(&ExecutionBatch::new(vec![TradePrint::new(dec!(100), dec!(1))]));
        clock.advance(Duration::milliseconds(-250));

        assert_eq!(state.snapshot().age, Some(Duration::zero()));
    }

    #[test]
    fn test_reset_volume() {
        let (_, state) = state();
        state.apply_executions(&ExecutionBatch::new(vec![TradePrint::sided(
            Side::Buy,
            dec!(100),
            dec!(2),
        )]));
        state.reset_volume();
        state.apply_executions(&ExecutionBatch::new(vec![TradePrint::new(
            dec!(100),
            dec!(0.5),
        )]));

        let snap = state.snapshot();
        assert_eq!(snap.volume_since_reset, dec!(0.5));
        assert_eq!(snap.buy_volume, Decimal::ZERO);
        assert_eq!(snap.last_trade_price, dec!(100));
    }
}
