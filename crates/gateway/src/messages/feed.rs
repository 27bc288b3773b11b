//! Feed message types

use scalper_core::{Market, OrderType, Price, Quantity, Side, Timestamp};
use serde::{Deserialize, Serialize};

/// A single public trade print
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePrint {
    pub price: Price,
    pub size: Quantity,
    /// Aggressor side. A buy-taker print traded at the ask, a sell-taker print at the bid.
    pub taker_side: Option<Side>,
    /// Exchange-side execution time, when the feed provides it
    pub executed_at: Option<Timestamp>,
}

impl TradePrint {
    /// Create an unsided print
    pub fn new(price: Price, size: Quantity) -> Self {
        Self {
            price,
            size,
            taker_side: None,
            executed_at: None,
        }
    }

    /// Create a print with a known aggressor side
    pub fn sided(side: Side, price: Price, size: Quantity) -> Self {
        Self {
            taker_side: Some(side),
            ..Self::new(price, size)
        }
    }

    pub fn with_executed_at(mut self, at: Timestamp) -> Self {
        self.executed_at = Some(at);
        self
    }
}

/// A batch of prints delivered together by the executions channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionBatch {
    pub prints: Vec<TradePrint>,
}

impl ExecutionBatch {
    pub fn new(prints: Vec<TradePrint>) -> Self {
        Self { prints }
    }

    pub fn is_empty(&self) -> bool {
        self.prints.is_empty()
    }

    /// Price of the last print in arrival order
    pub fn last_price(&self) -> Option<Price> {
        self.prints.last().map(|p| p.price)
    }

    /// Sum of print sizes, split as (total, buy-taker, sell-taker)
    pub fn volumes(&self) -> (Quantity, Quantity, Quantity) {
        self.prints.iter().fold(
            (Quantity::ZERO, Quantity::ZERO, Quantity::ZERO),
            |(total, buy, sell), print| match print.taker_side {
                Some(Side::Buy) => (total + print.size, buy + print.size, sell),
                Some(Side::Sell) => (total + print.size, buy, sell + print.size),
                None => (total + print.size, buy, sell),
            },
        )
    }

    /// Top of book implied by the batch: (bid, ask)
    ///
    /// The latest sell-taker print sets the bid and the latest buy-taker print
    /// sets the ask. A side with no prints in this batch yields `None`.
    pub fn implied_top(&self) -> (Option<Price>, Option<Price>) {
        let bid = self
            .prints
            .iter()
            .rev()
            .find(|p| p.taker_side == Some(Side::Sell))
            .map(|p| p.price);
        let ask = self
            .prints
            .iter()
            .rev()
            .find(|p| p.taker_side == Some(Side::Buy))
            .map(|p| p.price);
        (bid, ask)
    }

    /// Exchange timestamp of the last print, if stamped
    pub fn last_executed_at(&self) -> Option<Timestamp> {
        self.prints.last().and_then(|p| p.executed_at)
    }
}

/// Private order-status transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderEventKind {
    /// Order accepted and working
    Opened {
        side: Side,
        order_type: OrderType,
        price: Option<Price>,
        size: Quantity,
    },
    /// Full or partial execution
    Filled {
        side: Side,
        price: Option<Price>,
        size: Quantity,
    },
    Canceled,
    /// The exchange refused a cancel; the order keeps working
    CancelFailed,
    Expired,
    Rejected { reason: String },
}

/// Order event for a single child order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Exchange child-order acceptance id
    pub order_id: String,
    pub kind: OrderEventKind,
    pub at: Timestamp,
}

impl OrderEvent {
    pub fn new(order_id: impl Into<String>, kind: OrderEventKind, at: Timestamp) -> Self {
        Self {
            order_id: order_id.into(),
            kind,
            at,
        }
    }
}

/// Payload carried by a feed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedPayload {
    Executions(ExecutionBatch),
    OrderStatus(OrderEvent),
}

/// Decoded event tagged with the market it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEvent {
    pub market: Market,
    pub payload: FeedPayload,
}

impl FeedEvent {
    pub fn executions(market: Market, batch: ExecutionBatch) -> Self {
        Self {
            market,
            payload: FeedPayload::Executions(batch),
        }
    }

    pub fn order_status(market: Market, event: OrderEvent) -> Self {
        Self {
            market,
            payload: FeedPayload::OrderStatus(event),
        }
    }
}
