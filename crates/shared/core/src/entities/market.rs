use serde::{Deserialize, Serialize};
use std::fmt;

/// The two books the terminal watches on the same underlying asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// Immediate-settlement pair (e.g. BTC_JPY)
    Spot,
    /// Leveraged FX pair on the same underlying (e.g. FX_BTC_JPY)
    Margin,
}

impl Market {
    pub const ALL: [Market; 2] = [Market::Spot, Market::Margin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Spot => "spot",
            Market::Margin => "margin",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exchange product codes for each market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCodes {
    #[serde(default = "default_spot_code")]
    pub spot: String,
    #[serde(default = "default_margin_code")]
    pub margin: String,
}

fn default_spot_code() -> String {
    "BTC_JPY".to_string()
}

fn default_margin_code() -> String {
    "FX_BTC_JPY".to_string()
}

impl Default for ProductCodes {
    fn default() -> Self {
        Self {
            spot: default_spot_code(),
            margin: default_margin_code(),
        }
    }
}

impl ProductCodes {
    pub fn new(spot: impl Into<String>, margin: impl Into<String>) -> Self {
        Self {
            spot: spot.into(),
            margin: margin.into(),
        }
    }

    /// Product code traded on the given market
    pub fn code(&self, market: Market) -> &str {
        match market {
            Market::Spot => &self.spot,
            Market::Margin => &self.margin,
        }
    }

    /// Resolve a product code back to its market (case-insensitive)
    pub fn market_of(&self, code: &str) -> Option<Market> {
        if code.eq_ignore_ascii_case(&self.spot) {
            Some(Market::Spot)
        } else if code.eq_ignore_ascii_case(&self.margin) {
            Some(Market::Margin)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_codes() {
        let codes = ProductCodes::default();
        assert_eq!(codes.code(Market::Spot), "BTC_JPY");
        assert_eq!(codes.code(Market::Margin), "FX_BTC_JPY");
        assert_eq!(codes.market_of("fx_btc_jpy"), Some(Market::Margin));
        assert_eq!(codes.market_of("ETH_JPY"), None);
    }

    #[test]
    fn test_product_codes_partial_json() {
        let codes: ProductCodes = serde_json::from_str(r#"{"spot":"ETH_JPY"}"#).unwrap();
        assert_eq!(codes.spot, "ETH_JPY");
        assert_eq!(codes.margin, "FX_BTC_JPY");
    }
}
