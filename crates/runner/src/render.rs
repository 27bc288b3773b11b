//! Render loop
//!
//! Samples shared state on a fixed interval and hands a textual frame to a
//! sink. The loop also clears the activity log on its own, slower timer.

use chrono::Duration as ChronoDuration;
use log::info;
use scalper_core::Market;
use scalper_ports::{ActivityLog, QuotaKind, TradingApi};
use scalper_state::{MarketSnapshot, SharedState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::dispatcher::TradeSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub interval: Duration,
    pub log_reset_interval: Duration,
    /// Feeds older than this are flagged stale
    pub stale_after: ChronoDuration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            log_reset_interval: Duration::from_secs(2),
            stale_after: ChronoDuration::seconds(5),
        }
    }
}

/// One rendered screen
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Settings and quota, prices, position and premium
    pub status: [String; 3],
    pub log: Vec<String>,
    /// Markets whose last update is older than the stale threshold
    pub stale: Vec<Market>,
}

impl Frame {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.status.to_vec();
        lines.extend(self.log.iter().cloned());
        lines
    }
}

/// Destination for rendered frames
pub trait FrameSink: Send {
    fn draw(&mut self, frame: &Frame);
}

/// Writes frames to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl FrameSink for StdoutSink {
    fn draw(&mut self, frame: &Frame) {
        // clear screen, cursor home
        print!("\x1b[2J\x1b[H");
        for line in frame.lines() {
            println!("{}", line);
        }
    }
}

fn seconds(duration: Option<ChronoDuration>) -> f64 {
    duration
        .map(|d| d.num_milliseconds() as f64 / 1000.0)
        .unwrap_or(0.0)
}

pub struct RenderLoop {
    config: RenderConfig,
    state: SharedState,
    api: Arc<dyn TradingApi>,
    log: Arc<dyn ActivityLog>,
    settings: watch::Receiver<TradeSettings>,
}

impl RenderLoop {
    pub fn new(
        config: RenderConfig,
        state: SharedState,
        api: Arc<dyn TradingApi>,
        log: Arc<dyn ActivityLog>,
        settings: watch::Receiver<TradeSettings>,
    ) -> Self {
        Self {
            config,
            state,
            api,
            log,
            settings,
        }
    }

    fn is_stale(&self, snap: &MarketSnapshot) -> bool {
        snap.age.is_some_and(|age| age > self.config.stale_after)
    }

    /// Build a frame from the current state
    pub fn compose(&self) -> Frame {
        let settings = *self.settings.borrow();
        let spot = self.state.spot.snapshot();
        let margin = self.state.margin.snapshot();
        let net = self.state.margin_orders.net_position();
        let offset = margin.last_trade_price * settings.offset_ratio;

        let first = format!(
            "set size: {:.2}, diff: {:.0}, limit n/o: {}/{}",
            settings.size,
            offset,
            self.api.remaining_quota(QuotaKind::Api),
            self.api.remaining_quota(QuotaKind::Orders),
        );
        let second = format!(
            "LTP: {:.0} / {:.0}, Spread: {:.0} / {:.0}, volume: {:.2} / {:.2}",
            spot.last_trade_price,
            margin.last_trade_price,
            spot.spread(),
            margin.spread(),
            spot.volume_since_reset,
            margin.volume_since_reset,
        );
        let sfd = match self.state.premium.premium_pct() {
            Some(pct) => format!("{:.4}%", pct.round_dp(4)),
            None => "-".to_string(),
        };
        let mut third = format!(
            "has size: {:.2}, SFD: {}, delay: {:.3} / {:.3} sec",
            net,
            sfd,
            seconds(spot.feed_latency),
            seconds(margin.feed_latency),
        );

        let stale: Vec<Market> = [&spot, &margin]
            .into_iter()
            .filter(|snap| self.is_stale(snap))
            .map(|snap| snap.market)
            .collect();
        if !stale.is_empty() {
            let names: Vec<&str> = stale.iter().map(|m| m.as_str()).collect();
            third.push_str(&format!(" [stale: {}]", names.join(", ")));
        }

        Frame {
            status: [first, second, third],
            log: self.log.snapshot(),
            stale,
        }
    }

    /// Draw frames until shutdown. Returns the number of frames drawn.
    pub async fn run<F: FrameSink>(self, mut sink: F, shutdown: CancellationToken) -> u64 {
        info!("Render loop started");
        let mut frames = 0u64;
        let mut render = tokio::time::interval(self.config.interval);
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut reset = tokio::time::interval_at(
            Instant::now() + self.config.log_reset_interval,
            self.config.log_reset_interval,
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = render.tick() => {
                    sink.draw(&self.compose());
                    frames += 1;
                }
                _ = reset.tick() => self.log.reset(),
            }
        }

        info!("Render loop stopped after {} frames", frames);
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use scalper_clock::ManualClock;
    use scalper_core::{OrderAck, OrderRequest, Side};
    use scalper_gateway::{ExecutionBatch, OrderEvent, OrderEventKind, TradePrint};
    use scalper_ports::{ApiResult, Clock};
    use scalper_state::LogBuffer;

    struct FixedQuota;

    #[async_trait]
    impl TradingApi for FixedQuota {
        async fn place_order(&self, _request: &OrderRequest) -> ApiResult<OrderAck> {
            Ok(OrderAck::new("unused"))
        }

        async fn cancel_all(&self, _product_code: &str) -> ApiResult<()> {
            Ok(())
        }

        fn remaining_quota(&self, kind: QuotaKind) -> u32 {
            match kind {
                QuotaKind::Api => 500,
                QuotaKind::Orders => 300,
            }
        }
    }

    #[derive(Clone, Default)]
    struct CollectingSink(Arc<Mutex<Vec<Frame>>>);

    impl FrameSink for CollectingSink {
        fn draw(&mut self, frame: &Frame) {
            self.0.lock().push(frame.clone());
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        state: SharedState,
        log: Arc<LogBuffer>,
        settings_tx: watch::Sender<TradeSettings>,
        render: RenderLoop,
    }

    fn fixture(config: RenderConfig) -> Fixture {
        let clock = Arc::new(ManualClock::starting_now());
        let state = SharedState::new(clock.clone());
        let log = Arc::new(LogBuffer::new());
        let (settings_tx, settings_rx) = watch::channel(TradeSettings {
            size: dec!(0.01),
            offset_ratio: dec!(0.0002),
        });
        let render = RenderLoop::new(
            config,
            state.clone(),
            Arc::new(FixedQuota),
            log.clone(),
            settings_rx,
        );
        Fixture {
            clock,
            state,
            log,
            settings_tx,
            render,
        }
    }

    fn trade(state: &SharedState, market: Market, bid: Decimal, ltp: Decimal, ask: Decimal) {
        state.market(market).apply_executions(&ExecutionBatch::new(vec![
            TradePrint::sided(Side::Sell, bid, dec!(0.5)),
            TradePrint::sided(Side::Buy, ask, dec!(0.5)),
            TradePrint::new(ltp, dec!(0.25)),
        ]));
    }

    #[test]
    fn test_compose_status_lines() {
        let f = fixture(RenderConfig::default());
        trade(&f.state, Market::Spot, dec!(4999000), dec!(5000000), dec!(5001000));
        trade(&f.state, Market::Margin, dec!(5249000), dec!(5250000), dec!(5250500));
        f.state.recompute_premium();
        f.state.margin_orders.apply(&OrderEvent::new(
            "a",
            OrderEventKind::Filled {
                side: Side::Buy,
                price: None,
                size: dec!(0.03),
            },
            f.clock.now(),
        ));
        f.log.record(false, "ACK-1");

        let frame = f.render.compose();
        assert_eq!(frame.status[0], "set size: 0.01, diff: 1050, limit n/o: 500/300");
        assert_eq!(
            frame.status[1],
            "LTP: 5000000 / 5250000, Spread: 2000 / 1500, volume: 1.25 / 1.25"
        );
        assert_eq!(
            frame.status[2],
            "has size: 0.03, SFD: 5.0000%, delay: 0.000 / 0.000 sec"
        );
        assert_eq!(frame.log, vec!["ACK-1"]);
        assert!(frame.stale.is_empty());
        assert_eq!(frame.lines().len(), 4);
    }

    #[test]
    fn test_settings_changes_are_visible() {
        let f = fixture(RenderConfig::default());
        f.settings_tx.send_replace(TradeSettings {
            size: dec!(0.05),
            offset_ratio: Decimal::ZERO,
        });
        assert!(f.render.compose().status[0].starts_with("set size: 0.05, diff: 0,"));
    }

    #[test]
    fn test_premium_placeholder_before_both_markets_trade() {
        let f = fixture(RenderConfig::default());
        assert!(f.render.compose().status[2].contains("SFD: -"));
    }

    #[test]
    fn test_stale_feed_is_flagged() {
        let f = fixture(RenderConfig::default());
        trade(&f.state, Market::Spot, dec!(99), dec!(100), dec!(101));
        f.clock.advance(ChronoDuration::seconds(6));
        trade(&f.state, Market::Margin, dec!(104), dec!(105), dec!(106));

        let frame = f.render.compose();
        assert_eq!(frame.stale, vec![Market::Spot]);
        assert!(frame.status[2].ends_with("[stale: spot]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_draws_and_resets_log() {
        let f = fixture(RenderConfig {
            interval: Duration::from_millis(100),
            log_reset_interval: Duration::from_millis(250),
            stale_after: ChronoDuration::seconds(5),
        });
        let sink = CollectingSink::default();
        let frames = sink.0.clone();
        let shutdown = CancellationToken::new();
        f.log.record(false, "hello");

        let handle = tokio::spawn(f.render.run(sink, shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(320)).await;
        assert!(f.log.is_empty());

        shutdown.cancel();
        let drawn = handle.await.unwrap();
        assert!(drawn >= 3);
        assert_eq!(frames.lock().len() as u64, drawn);
        assert_eq!(frames.lock()[0].log, vec!["hello"]);
    }
}
