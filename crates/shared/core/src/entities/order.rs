use serde::{Deserialize, Serialize};

use super::{Market, OrderType, Side, TimeInForce};
use crate::values::{Price, Quantity};

/// Child-order submission handed to the trading API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Market whose book receives the order
    pub market: Market,
    /// Exchange product code for `market`
    pub product_code: String,
    pub order_type: OrderType,
    pub side: Side,
    pub time_in_force: TimeInForce,
    /// Required for limit orders, ignored for market orders
    pub price: Option<Price>,
    pub size: Quantity,
    /// Minutes until the exchange expires the order
    pub expire_minutes: u32,
}

impl OrderRequest {
    /// Create a new market order request (GTC, as the exchange expects for market orders)
    pub fn market(
        market: Market,
        product_code: impl Into<String>,
        side: Side,
        size: Quantity,
        expire_minutes: u32,
    ) -> Self {
        Self {
            market,
            product_code: product_code.into(),
            order_type: OrderType::Market,
            side,
            time_in_force: TimeInForce::GTC,
            price: None,
            size,
            expire_minutes,
        }
    }

    /// Create a new limit order request
    pub fn limit(
        market: Market,
        product_code: impl Into<String>,
        side: Side,
        price: Price,
        size: Quantity,
        time_in_force: TimeInForce,
        expire_minutes: u32,
    ) -> Self {
        Self {
            market,
            product_code: product_code.into(),
            order_type: OrderType::Limit,
            side,
            time_in_force,
            price: Some(price),
            size,
            expire_minutes,
        }
    }

    /// Validate the order based on order type requirements
    pub fn validate(&self) -> bool {
        if self.size <= Quantity::ZERO {
            return false;
        }
        match self.order_type {
            OrderType::Market => true,
            OrderType::Limit => self.price.is_some_and(|p| p > Price::ZERO),
        }
    }
}

/// Exchange acknowledgement of an accepted child order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub acceptance_id: String,
}

impl OrderAck {
    pub fn new(acceptance_id: impl Into<String>) -> Self {
        Self {
            acceptance_id: acceptance_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_market_order_has_no_price() {
        let order = OrderRequest::market(Market::Margin, "FX_BTC_JPY", Side::Buy, dec!(0.01), 1);
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.time_in_force, TimeInForce::GTC);
        assert!(order.price.is_none());
        assert!(order.validate());
    }

    #[test]
    fn test_limit_order_validation() {
        let order = OrderRequest::limit(
            Market::Spot,
            "BTC_JPY",
            Side::Sell,
            dec!(5000000),
            dec!(0.01),
            TimeInForce::IOC,
            1,
        );
        assert!(order.validate());

        let zero_price = OrderRequest {
            price: Some(Price::ZERO),
            ..order.clone()
        };
        assert!(!zero_price.validate());

        let zero_size = OrderRequest {
            size: Quantity::ZERO,
            ..order
        };
        assert!(!zero_size.validate());
    }
}
