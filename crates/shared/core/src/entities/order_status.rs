use serde::{Deserialize, Serialize};

/// Status of a working order as tracked from private order events
///
/// Orders leave the ledger when they complete or are canceled, so only the
/// working states are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order accepted and working
    Open,
    /// Order has been partially filled and is still working
    PartiallyFilled,
}
