//! Scalper Runner - manual trading terminal
//!
//! Runs the terminal's three long-lived tasks over the shared state:
//!
//! - **Event Router**: the single writer; folds the merged feed into market
//!   state, order ledgers and the premium ratio
//! - **Command Dispatcher**: turns operator commands into trading-API calls
//! - **Render Loop**: samples state into status frames and clears the log
//!
//! ## Architecture
//!
//! ```text
//!   Spot feed      Margin feed     Private order events
//!       │               │                  │
//!       └───────────────┼──────────────────┘
//!                       ▼ bounded merged channel
//!              ┌─────────────────┐
//!              │  Event Router   │ (only writer)
//!              └────────┬────────┘
//!                       ▼
//! ┌─────────────────────────────────────────────────┐
//! │ SharedState: MarketState x2, OrderLedger x2,    │
//! │              PremiumEstimator                   │
//! └───────┬──────────────────────────────┬──────────┘
//!         │ snapshots                    │ snapshots
//!         ▼                              ▼
//! ┌──────────────────┐  settings  ┌──────────────┐
//! │ Command          │ ─────────► │ Render Loop  │ ──► FrameSink
//! │ Dispatcher       │  (watch)   └──────────────┘
//! └────────┬─────────┘                   ▲
//!          │ PlaceOrder / CancelAll      │ LogBuffer
//!          ▼                             │
//!     TradingApi ────────────────────────┘
//! ```

pub mod config;
pub mod dispatcher;
pub mod render;
pub mod router;
pub mod terminal;

// Re-export main types
pub use config::{ConfigError, TerminalConfig};
pub use dispatcher::{
    Command, CommandDispatcher, Dispatch, DispatchConfig, ParseCommandError, Plan, TradeSettings,
};
pub use render::{Frame, FrameSink, RenderConfig, RenderLoop, StdoutSink};
pub use router::{EventRouter, RouterStats};
pub use terminal::{RunningTerminal, Terminal, TerminalError, TerminalReport};
