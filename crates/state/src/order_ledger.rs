//! Per-market order ledger
//!
//! Tracks working orders and the net filled position from private
//! order-status events. Orders and position accumulators share one lock, so
//! an event is applied as a single transaction.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use scalper_core::{Market, OrderStatus, OrderType, Price, Quantity, Side, Timestamp};
use scalper_gateway::{OrderEvent, OrderEventKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Fills seen ahead of their open event that are remembered for reconciliation
const EARLY_FILL_CAPACITY: usize = 1024;

/// A working order as seen through the private feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedOrder {
    pub order_id: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub size: Quantity,
    pub filled: Quantity,
    pub status: OrderStatus,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TrackedOrder {
    pub fn remaining(&self) -> Quantity {
        (self.size - self.filled).max(Decimal::ZERO)
    }
}

/// Long, short and net filled quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    pub long: Quantity,
    pub short: Quantity,
    pub net: Quantity,
}

/// What an applied event did to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    /// Order entered the open set
    Opened,
    /// Known order refreshed by a repeated open event
    Updated,
    PartiallyFilled,
    /// Order fully filled and left the open set
    Completed,
    /// Canceled, expired or rejected order left the open set
    Removed,
    /// Nothing to do (cancel-failed, or a terminal event for an unknown id)
    Unchanged,
}

#[derive(Debug, Default)]
struct Book {
    orders: HashMap<String, TrackedOrder>,
    /// Filled quantity of ids whose fill arrived before their open event
    early_fills: HashMap<String, Quantity>,
    early_fill_order: VecDeque<String>,
    long_filled: Quantity,
    short_filled: Quantity,
}

impl Book {
    fn remember_early_fill(&mut self, id: &str, size: Quantity) {
        if let Some(filled) = self.early_fills.get_mut(id) {
            *filled += size;
            return;
        }
        if self.early_fill_order.len() == EARLY_FILL_CAPACITY {
            if let Some(oldest) = self.early_fill_order.pop_front() {
                self.early_fills.remove(&oldest);
            }
        }
        self.early_fills.insert(id.to_string(), size);
        self.early_fill_order.push_back(id.to_string());
    }

    fn take_early_fill(&mut self, id: &str) -> Quantity {
        match self.early_fills.remove(id) {
            Some(filled) => {
                self.early_fill_order.retain(|known| known != id);
                filled
            }
            None => Decimal::ZERO,
        }
    }

    fn record_fill(&mut self, side: Side, size: Quantity) {
        match side {
            Side::Buy => self.long_filled += size,
            Side::Sell => self.short_filled += size,
        }
    }

    fn exposure(&self) -> Exposure {
        Exposure {
            long: self.long_filled,
            short: self.short_filled,
            net: self.long_filled - self.short_filled,
        }
    }
}

/// Thread-safe ledger for one market
pub struct OrderLedger {
    market: Market,
    book: RwLock<Book>,
}

impl OrderLedger {
    pub fn new(market: Market) -> Self {
        Self {
            market,
            book: RwLock::new(Book::default()),
        }
    }

    pub fn market(&self) -> Market {
        self.market
    }

    /// Apply one order-status transition
    ///
    /// A fill for an id that was never opened is taken as a newly observed
    /// order of exactly the filled size, so it counts toward the position and
    /// completes immediately. If the open event for that id arrives later,
    /// the earlier fills are carried over: a fully filled order stays out of
    /// the open set and a partially filled one opens with its remainder.
    pub fn apply(&self, event: &OrderEvent) -> LedgerChange {
        let mut book = self.book.write();
        let id = event.order_id.as_str();

        match &event.kind {
            OrderEventKind::Opened {
                side,
                order_type,
                price,
                size,
            } => match book.orders.get_mut(id) {
                Some(order) => {
                    order.side = *side;
                    order.order_type = *order_type;
                    order.price = *price;
                    order.size = *size;
                    order.updated_at = event.at;
                    LedgerChange::Updated
                }
                None => {
                    let filled = book.take_early_fill(id);
                    if !filled.is_zero() && filled >= *size {
                        return LedgerChange::Completed;
                    }
                    let status = if filled.is_zero() {
                        OrderStatus::Open
                    } else {
                        OrderStatus::PartiallyFilled
                    };
                    book.orders.insert(
                        id.to_string(),
                        TrackedOrder {
                            order_id: id.to_string(),
                            side: *side,
                            order_type: *order_type,
                            price: *price,
                            size: *size,
                            filled,
                            status,
                            opened_at: event.at,
                            updated_at: event.at,
                        },
                    );
                    LedgerChange::Opened
                }
            },
            OrderEventKind::Filled { side, size, .. } => {
                book.record_fill(*side, *size);
                let Some(order) = book.orders.get_mut(id) else {
                    book.remember_early_fill(id, *size);
                    return LedgerChange::Completed;
                };
                order.filled += *size;
                order.updated_at = event.at;
                if order.remaining().is_zero() {
                    book.orders.remove(id);
                    LedgerChange::Completed
                } else {
                    order.status = OrderStatus::PartiallyFilled;
                    LedgerChange::PartiallyFilled
                }
            }
            OrderEventKind::Canceled | OrderEventKind::Expired | OrderEventKind::Rejected { .. } => {
                if book.orders.remove(id).is_some() {
                    LedgerChange::Removed
                } else {
                    LedgerChange::Unchanged
                }
            }
            OrderEventKind::CancelFailed => LedgerChange::Unchanged,
        }
    }

    /// Filled quantities as (long, short, net)
    pub fn sum(&self) -> Exposure {
        self.book.read().exposure()
    }

    pub fn net_position(&self) -> Quantity {
        self.sum().net
    }

    /// Copy of the open orders, oldest first
    pub fn snapshot(&self) -> Vec<TrackedOrder> {
        let mut orders: Vec<TrackedOrder> = self.book.read().orders.values().cloned().collect();
        orders.sort_by(|a, b| {
            a.opened_at
                .cmp(&b.opened_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        orders
    }

    pub fn open_count(&self) -> usize {
        self.book.read().orders.len()
    }
}
