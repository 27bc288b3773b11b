//! Terminal configuration
//!
//! Loaded from a JSON file; every field has a default, so `{}` is a valid
//! configuration.

use rust_decimal::Decimal;
use scalper_core::{Market, ProductCodes, Quantity};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::dispatcher::DispatchConfig;
use crate::render::RenderConfig;

/// Upper bound for every millisecond timing field
const MAX_INTERVAL_MS: u64 = 86_400_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration for the terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub products: ProductCodes,
    /// Market that order commands trade on
    pub target_market: Market,

    /// Order size for every order command
    pub trade_size: Quantity,
    /// Increment applied by the size commands
    pub size_step: Quantity,
    /// Offset ratio at startup (fraction of the margin LTP)
    pub offset_ratio: Decimal,
    /// Increment applied by the offset commands
    pub offset_ratio_step: Decimal,
    /// Positions smaller than this are treated as flat
    pub flatten_epsilon: Quantity,
    /// Premium ratio at which the exchange starts charging SFD
    pub sfd_threshold: Decimal,
    /// Exchange price increment
    pub price_tick: Decimal,
    pub expire_minutes: u32,

    /// Bounded size of the merged feed channel
    pub feed_capacity: usize,
    /// Bounded size of the command queue
    pub command_capacity: usize,

    pub render_interval_ms: u64,
    pub log_reset_interval_ms: u64,
    /// Feeds older than this are flagged stale on screen
    pub stale_after_ms: u64,

    /// Seed for the simulated feeds; random when absent
    pub simulation_seed: Option<u64>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            products: ProductCodes::default(),
            target_market: Market::Margin,
            trade_size: Decimal::new(1, 2),
            size_step: Decimal::new(1, 2),
            offset_ratio: Decimal::ZERO,
            offset_ratio_step: Decimal::new(1, 4),
            flatten_epsilon: Decimal::new(1, 2),
            sfd_threshold: Decimal::new(105, 2),
            price_tick: Decimal::ONE,
            expire_minutes: 1,
            feed_capacity: 1024,
            command_capacity: 64,
            render_interval_ms: 1000,
            log_reset_interval_ms: 2000,
            stale_after_ms: 5000,
            simulation_seed: None,
        }
    }
}

impl TerminalConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("trade_size", self.trade_size),
            ("size_step", self.size_step),
            ("price_tick", self.price_tick),
            ("sfd_threshold", self.sfd_threshold),
        ];
        for (name, value) in positive {
            if value <= Decimal::ZERO {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }

        let non_negative = [
            ("offset_ratio", self.offset_ratio),
            ("offset_ratio_step", self.offset_ratio_step),
            ("flatten_epsilon", self.flatten_epsilon),
        ];
        for (name, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(ConfigError::Invalid(format!("{} must not be negative", name)));
            }
        }

        if self.feed_capacity == 0 || self.command_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel capacities must be positive".to_string(),
            ));
        }
        if self.render_interval_ms == 0 || self.log_reset_interval_ms == 0 {
            return Err(ConfigError::Invalid("intervals must be positive".to_string()));
        }
        let timings = [
            ("render_interval_ms", self.render_interval_ms),
            ("log_reset_interval_ms", self.log_reset_interval_ms),
            ("stale_after_ms", self.stale_after_ms),
        ];
        for (name, value) in timings {
            if value > MAX_INTERVAL_MS {
                return Err(ConfigError::Invalid(format!(
                    "{} must not exceed {} (one day)",
                    name, MAX_INTERVAL_MS
                )));
            }
        }
        if self.products.spot.is_empty() || self.products.margin.is_empty() {
            return Err(ConfigError::Invalid("product codes must be set".to_string()));
        }
        Ok(())
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            products: self.products.clone(),
            target_market: self.target_market,
            trade_size: self.trade_size,
            size_step: self.size_step,
            offset_ratio: self.offset_ratio,
            offset_ratio_step: self.offset_ratio_step,
            flatten_epsilon: self.flatten_epsilon,
            sfd_threshold: self.sfd_threshold,
            price_tick: self.price_tick,
            expire_minutes: self.expire_minutes,
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            interval: Duration::from_millis(self.render_interval_ms),
            log_reset_interval: Duration::from_millis(self.log_reset_interval_ms),
            stale_after: chrono::Duration::milliseconds(
                self.stale_after_ms.min(MAX_INTERVAL_MS) as i64,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = TerminalConfig::from_json("{}").unwrap();
        assert_eq!(config, TerminalConfig::default());
        assert_eq!(config.products.margin, "FX_BTC_JPY");
        assert_eq!(config.target_market, Market::Margin);
        assert_eq!(config.flatten_epsilon, dec!(0.01));
        assert_eq!(config.sfd_threshold, dec!(1.05));
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "products": { "spot": "ETH_JPY" },
            "target_market": "spot",
            "trade_size": "0.05",
            "feed_capacity": 16
        }"#;
        let config = TerminalConfig::from_json(json).unwrap();
        assert_eq!(config.products.spot, "ETH_JPY");
        assert_eq!(config.products.margin, "FX_BTC_JPY");
        assert_eq!(config.target_market, Market::Spot);
        assert_eq!(config.trade_size, dec!(0.05));
        assert_eq!(config.feed_capacity, 16);
        assert_eq!(config.command_capacity, 64);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            TerminalConfig::from_json(r#"{"trade_size": "0"}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TerminalConfig::from_json(r#"{"feed_capacity": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TerminalConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_oversized_timings_rejected() {
        let config = TerminalConfig {
            stale_after_ms: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert_eq!(
            config.render_config().stale_after,
            chrono::Duration::milliseconds(MAX_INTERVAL_MS as i64)
        );

        let json = r#"{ "log_reset_interval_ms": 86400001 }"#;
        assert!(matches!(
            TerminalConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = TerminalConfig::from_file("/nonexistent/scalper.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_render_config_conversion() {
        let render = TerminalConfig::default().render_config();
        assert_eq!(render.interval, Duration::from_secs(1));
        assert_eq!(render.log_reset_interval, Duration::from_secs(2));
        assert_eq!(render.stale_after, chrono::Duration::seconds(5));
    }
}
