//! Cross-market premium ratio (margin LTP / spot LTP)

use parking_lot::RwLock;
use rust_decimal::Decimal;
use scalper_core::Price;

use crate::market_state::MarketState;

/// Holds the latest premium ratio
///
/// The ratio is recomputed from whichever prices are freshest for each
/// market; the two prices are not required to come from the same instant.
#[derive(Debug, Default)]
pub struct PremiumEstimator {
    ratio: RwLock<Decimal>,
}

impl PremiumEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `margin / spot` and return it. A zero spot price leaves the
    /// previous ratio in place and returns `None`.
    pub fn recompute(&self, spot: Price, margin: Price) -> Option<Decimal> {
        let ratio = margin.checked_div(spot)?;
        *self.ratio.write() = ratio;
        Some(ratio)
    }

    /// Recompute from the two markets, reading each through its own lock
    pub fn recompute_from(&self, spot: &MarketState, margin: &MarketState) -> Option<Decimal> {
        let spot_ltp = spot.last_trade_price();
        let margin_ltp = margin.last_trade_price();
        self.recompute(spot_ltp, margin_ltp)
    }

    pub fn ratio(&self) -> Decimal {
        *self.ratio.read()
    }

    /// (ratio - 1) x 100, or `None` until a ratio has been computed
    pub fn premium_pct(&self) -> Option<Decimal> {
        let ratio = self.ratio();
        if ratio.is_zero() {
            return None;
        }
        Some((ratio - Decimal::ONE) * Decimal::ONE_HUNDRED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ratio() {
        let premium = PremiumEstimator::new();
        assert_eq!(premium.recompute(dec!(100), dec!(105)), Some(dec!(1.05)));
        assert_eq!(premium.ratio(), dec!(1.05));
        assert_eq!(premium.premium_pct(), Some(dec!(5.00)));
    }

    #[test]
    fn test_zero_spot_keeps_prior_value() {
        let premium = PremiumEstimator::new();
        assert_eq!(premium.recompute(dec!(0), dec!(105)), None);
        assert_eq!(premium.ratio(), Decimal::ZERO);
        assert_eq!(premium.premium_pct(), None);

        premium.recompute(dec!(100), dec!(104));
        assert_eq!(premium.recompute(Decimal::ZERO, dec!(200)), None);
        assert_eq!(premium.ratio(), dec!(1.04));
    }
}
