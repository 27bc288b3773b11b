//! Scalper Ports
//!
//! Port definitions (traits) for the scalper trading terminal.
//! These define the boundaries between the terminal core and its external
//! collaborators: time, the trading API, and the operator-facing log.

mod activity;
mod clock;
mod error;
mod trading;

pub use activity::ActivityLog;
pub use clock::Clock;
pub use error::{ApiError, ApiResult};
pub use trading::{QuotaKind, TradingApi};
