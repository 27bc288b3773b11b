//! Simulated public execution feed
//!
//! Random-walk trade prints for one market, published as execution batches.
//! Stands in for the exchange's executions channel when running the terminal
//! without a live connection.

use chrono::Utc;
use log::{debug, info};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use scalper_core::{Market, Price, Side};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::messages::{ExecutionBatch, FeedEvent, TradePrint};
use crate::transport::{FeedPublisher, Publisher};

/// Configuration for a simulated execution feed
#[derive(Debug, Clone)]
pub struct SimulatedFeedConfig {
    pub market: Market,
    /// Starting mid price
    pub initial_price: Price,
    /// Per-batch volatility of the mid (fraction, e.g. 0.0005 = 0.05%)
    pub volatility: f64,
    /// Distance between the bid and ask prints
    pub spread: Price,
    /// Upper bound on prints per batch
    pub max_prints: usize,
    /// Delay between batches
    pub interval: Duration,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl SimulatedFeedConfig {
    pub fn spot() -> Self {
        Self {
            market: Market::Spot,
            initial_price: Decimal::new(5_000_000, 0),
            volatility: 0.0003,
            spread: Decimal::new(500, 0),
            max_prints: 5,
            interval: Duration::from_millis(250),
            seed: None,
        }
    }

    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.initial_price <= Decimal::ZERO {
            return Err(GatewayError::InvalidConfig(
                "initial_price must be positive".to_string(),
            ));
        }
        if self.spread < Decimal::ZERO || !(0.0..1.0).contains(&self.volatility) {
            return Err(GatewayError::InvalidConfig(
                "spread and volatility out of range".to_string(),
            ));
        }
        if self.max_prints == 0 || self.interval.is_zero() {
            return Err(GatewayError::InvalidConfig(
                "max_prints and interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Margin feed trading at a small premium over spot
    pub fn margin() -> Self {
        Self {
            market: Market::Margin,
            initial_price: Decimal::new(5_150_000, 0),
            ..Self::spot()
        }
    }
}

/// Generates random-walk execution batches for one market
pub struct SimulatedFeed {
    config: SimulatedFeedConfig,
    mid: f64,
    rng: StdRng,
}

impl SimulatedFeed {
    pub fn new(config: SimulatedFeedConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let mid = config.initial_price.to_f64().unwrap_or(0.0);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, mid, rng })
    }

    pub fn market(&self) -> Market {
        self.config.market
    }

    /// Generate the next batch (1..=max_prints prints, the last one unsided at mid)
    pub fn next_batch(&mut self) -> ExecutionBatch {
        let shock: f64 = self.rng.gen_range(-1.0..1.0) * self.config.volatility;
        self.mid = (self.mid * (1.0 + shock)).max(1.0);

        let mid = to_price(self.mid);
        let half_spread = self.config.spread / Decimal::TWO;
        let count = self.rng.gen_range(1..=self.config.max_prints.max(1));
        let now = Utc::now();

        let mut prints = Vec::with_capacity(count);
        for i in 0..count {
            let size = to_size(self.rng.gen_range(0.001..0.5));
            let print = if i + 1 == count {
                TradePrint::new(mid, size)
            } else if self.rng.gen_bool(0.5) {
                TradePrint::sided(Side::Buy, (mid + half_spread).ceil(), size)
            } else {
                TradePrint::sided(Side::Sell, (mid - half_spread).floor(), size)
            };
            prints.push(print.with_executed_at(now));
        }
        ExecutionBatch::new(prints)
    }

    /// Publish batches until shutdown or until the channel closes.
    /// Returns the number of batches published.
    pub async fn run(mut self, publisher: FeedPublisher, shutdown: CancellationToken) -> u64 {
        info!("Simulated {} feed started", self.config.market);
        let mut ticker = tokio::time::interval(self.config.interval);
        let mut published = 0u64;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let batch = self.next_batch();
                    debug!("{} feed: {} prints", self.config.market, batch.prints.len());
                    let event = FeedEvent::executions(self.config.market, batch);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        sent = publisher.publish(event) => {
                            if sent.is_err() {
                                break;
                            }
                            published += 1;
                        }
                    }
                }
            }
        }

        info!("Simulated {} feed stopped after {} batches", self.config.market, published);
        published
    }
}

fn to_price(value: f64) -> Price {
    Decimal::from_f64_retain(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp(0)
}

fn to_size(value: f64) -> Decimal {
    Decimal::from_f64_retain(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp(3)
        .max(Decimal::new(1, 3))
}
