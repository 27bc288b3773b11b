//! Scalper Core Domain
//!
//! Pure domain types for the scalper trading terminal.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    Market, OrderAck, OrderRequest, OrderStatus, OrderType, ProductCodes, Side, TimeInForce,
};
pub use values::{Price, Quantity, Timestamp};
