use serde::{Deserialize, Serialize};

/// Time-in-force instructions for order validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good Till Canceled: order remains active until explicitly canceled or expired
    GTC,

    /// Immediate or Cancel: execute immediately (partially or fully) and cancel unfilled portion
    IOC,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GTC => "GTC",
            TimeInForce::IOC => "IOC",
        }
    }

    /// Returns true if an unfilled remainder may rest on the book
    pub fn can_rest(&self) -> bool {
        matches!(self, TimeInForce::GTC)
    }
}
