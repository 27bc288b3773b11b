//! Concurrent snapshot integration test
//!
//! One event router task consumes 1000 interleaved batches from the merged
//! feed while ten reader threads take snapshots. Every batch moves LTP, bid
//! and ask together, so any snapshot mixing two updates would break
//! `bid == ltp - 1` or `ask == ltp + 1`. Every premium read must be a ratio
//! the router could actually have written.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use scalper_clock::SystemClock;
use scalper_core::{Market, Side};
use scalper_gateway::{ExecutionBatch, FeedEvent, Publisher, TradePrint, feed_channel};
use scalper_runner::EventRouter;
use scalper_state::{MarketSnapshot, SharedState};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tokio_util::sync::CancellationToken;

const BATCHES: u32 = 1000;
const READERS: usize = 10;

fn market_of(i: u32) -> Market {
    if i % 2 == 0 { Market::Spot } else { Market::Margin }
}

fn ltp_of(i: u32) -> Decimal {
    Decimal::from(1_000_000 + i)
}

fn batch(ltp: Decimal) -> ExecutionBatch {
    ExecutionBatch::new(vec![
        TradePrint::sided(Side::Sell, ltp - Decimal::ONE, dec!(0.01)),
        TradePrint::sided(Side::Buy, ltp + Decimal::ONE, dec!(0.01)),
        TradePrint::new(ltp, dec!(0.01)),
    ])
}

/// Every ratio the router writes while replaying the sequence, plus the
/// initial zero
fn reachable_ratios() -> HashSet<Decimal> {
    let mut ratios = HashSet::from([Decimal::ZERO]);
    let (mut spot, mut margin) = (Decimal::ZERO, Decimal::ZERO);
    for i in 0..BATCHES {
        match market_of(i) {
            Market::Spot => spot = ltp_of(i),
            Market::Margin => margin = ltp_of(i),
        }
        if let Some(ratio) = margin.checked_div(spot) {
            ratios.insert(ratio);
        }
    }
    ratios
}

fn assert_consistent(snap: &MarketSnapshot) {
    if !snap.has_traded() {
        return;
    }
    assert_eq!(snap.best_bid, snap.last_trade_price - Decimal::ONE, "torn bid: {:?}", snap);
    assert_eq!(snap.best_ask, snap.last_trade_price + Decimal::ONE, "torn ask: {:?}", snap);
    // three prints of 0.01 per batch
    assert_eq!(
        (snap.volume_since_reset / dec!(0.03)).fract(),
        Decimal::ZERO,
        "torn volume: {:?}",
        snap
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_readers_never_observe_torn_state() {
    let state = SharedState::new(Arc::new(SystemClock::new()));
    let ratios = Arc::new(reachable_ratios());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let state = state.clone();
            let ratios = ratios.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut reads = 0u64;
                loop {
                    let finished = done.load(Ordering::Acquire);
                    for market in Market::ALL {
                        assert_consistent(&state.market(market).snapshot());
                    }
                    let ratio = state.premium.ratio();
                    assert!(ratios.contains(&ratio), "unreachable ratio: {}", ratio);
                    reads += 1;
                    if finished {
                        break;
                    }
                }
                reads
            })
        })
        .collect();

    let (publisher, subscriber) = feed_channel(64);
    let router = EventRouter::new(state.clone());
    let router = tokio::spawn(router.run(subscriber, CancellationToken::new()));

    for i in 0..BATCHES {
        publisher
            .publish(FeedEvent::executions(market_of(i), batch(ltp_of(i))))
            .await
            .unwrap();
    }
    drop(publisher);

    let stats = router.await.unwrap();
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }

    assert_eq!(stats.spot_batches, u64::from(BATCHES / 2));
    assert_eq!(stats.margin_batches, u64::from(BATCHES / 2));
    assert_eq!(stats.premium_updates, u64::from(BATCHES));

    let spot = state.spot.snapshot();
    let margin = state.margin.snapshot();
    assert_eq!(spot.last_trade_price, ltp_of(BATCHES - 2));
    assert_eq!(margin.last_trade_price, ltp_of(BATCHES - 1));
    assert_eq!(spot.volume_since_reset, dec!(0.03) * Decimal::from(BATCHES / 2));
    assert_eq!(
        state.premium.ratio(),
        margin.last_trade_price / spot.last_trade_price
    );
}
