//! Reference exchange collaborators
//!
//! Stand-ins for the real exchange connections so the terminal can run and be
//! tested end to end: a paper trading API that also emits private order events,
//! and a simulated public execution feed.

pub mod paper;
pub mod simulated;

pub use paper::{PaperConfig, PaperTradingApi};
pub use simulated::{SimulatedFeed, SimulatedFeedConfig};
