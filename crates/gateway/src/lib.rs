//! Scalper Gateway
//!
//! Gateway layer for the scalper terminal. Provides:
//! - Decoded feed message types (public executions, private order events)
//! - The bounded merged feed channel both live feeds publish into
//! - Reference collaborators: a paper trading API and a simulated execution feed
//!
//! ## Architecture
//!
//! ```text
//!  Public executions feed      Private order-event feed
//!  (spot + margin)             (PaperTradingApi / exchange)
//!          │                             │
//!          └──────────┐     ┌────────────┘
//!                     ▼     ▼
//!               ┌──────────────────┐
//!               │  feed_channel()  │  bounded, producers wait when full
//!               └────────┬─────────┘
//!                        │ FeedEvent { market, payload }
//!                        ▼
//!                  Event router (single consumer)
//! ```

pub mod adapters;
pub mod error;
pub mod messages;
pub mod transport;

// Re-export commonly used types
pub use adapters::{PaperConfig, PaperTradingApi, SimulatedFeed, SimulatedFeedConfig};
pub use error::{GatewayError, TransportError};
pub use messages::feed::{
    ExecutionBatch, FeedEvent, FeedPayload, OrderEvent, OrderEventKind, TradePrint,
};
pub use transport::{
    Publisher, Subscriber,
    channel::{ChannelPublisher, ChannelSubscriber, FeedPublisher, FeedSubscriber, feed_channel},
};
