//! Paper trading adapter
//!
//! Accepts orders locally, enforces exchange-style request quotas, and echoes
//! the resulting order lifecycle onto the merged feed as private events.

mod quota;
mod trading_api;

pub use quota::TokenBucket;
pub use trading_api::{PaperConfig, PaperTradingApi};
