use async_trait::async_trait;
use scalper_core::{OrderAck, OrderRequest};

use crate::error::ApiResult;

/// Which rate-limit bucket to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaKind {
    /// Public/private API request weight
    Api,
    /// Order placement budget
    Orders,
}

/// Port for the exchange's order API
///
/// Authentication, signing and rate-limit bookkeeping live behind this trait.
/// The terminal only places orders, cancels everything on a product, and reads
/// the remaining quota for display.
#[async_trait]
pub trait TradingApi: Send + Sync {
    /// Submit a child order, returning the exchange acceptance id
    async fn place_order(&self, request: &OrderRequest) -> ApiResult<OrderAck>;

    /// Cancel every working order on a product
    async fn cancel_all(&self, product_code: &str) -> ApiResult<()>;

    /// Remaining requests in the given bucket; never blocks
    fn remaining_quota(&self, kind: QuotaKind) -> u32;
}
