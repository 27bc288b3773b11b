//! Paper trading API
//!
//! Implements the `TradingApi` port without touching an exchange. Market and
//! IOC orders fill in full immediately; GTC limit orders rest until
//! `cancel_all` is called for their product. Every transition is published to
//! the merged feed, exactly as the exchange's private order channel would.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::Mutex;
use scalper_core::{OrderAck, OrderRequest, OrderType, ProductCodes};
use scalper_ports::{ApiError, ApiResult, QuotaKind, TradingApi};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use super::quota::TokenBucket;
use crate::messages::{FeedEvent, OrderEvent, OrderEventKind};
use crate::transport::{FeedPublisher, Publisher};

/// Configuration for the paper trading API
#[derive(Debug, Clone)]
pub struct PaperConfig {
    pub products: ProductCodes,
    /// Request budget per window (every call consumes one)
    pub api_limit: u32,
    pub api_window: Duration,
    /// Order budget per window (placements only)
    pub order_limit: u32,
    pub order_window: Duration,
}

impl Default for PaperConfig {
    fn default() -> Self {
        // bitFlyer-like defaults: 500 requests and 300 orders per 5 minutes
        Self {
            products: ProductCodes::default(),
            api_limit: 500,
            api_window: Duration::from_secs(300),
            order_limit: 300,
            order_window: Duration::from_secs(300),
        }
    }
}

/// Paper implementation of the trading API port
pub struct PaperTradingApi {
    config: PaperConfig,
    api_bucket: Mutex<TokenBucket>,
    order_bucket: Mutex<TokenBucket>,
    /// Resting GTC limit orders by acceptance id
    resting: Mutex<HashMap<String, OrderRequest>>,
    /// Every accepted request, in acceptance order
    accepted: Mutex<Vec<OrderRequest>>,
    /// When set, every placement is rejected with this reason
    reject_reason: Mutex<Option<String>>,
    events: Option<FeedPublisher>,
}

impl PaperTradingApi {
    /// Create a paper API that does not publish order events
    pub fn new(config: PaperConfig) -> Self {
        let api_bucket = TokenBucket::new(config.api_limit, config.api_window);
        let order_bucket = TokenBucket::new(config.order_limit, config.order_window);
        Self {
            config,
            api_bucket: Mutex::new(api_bucket),
            order_bucket: Mutex::new(order_bucket),
            resting: Mutex::new(HashMap::new()),
            accepted: Mutex::new(Vec::new()),
            reject_reason: Mutex::new(None),
            events: None,
        }
    }

    /// Publish order lifecycle events onto the merged feed
    pub fn with_events(mut self, publisher: FeedPublisher) -> Self {
        self.events = Some(publisher);
        self
    }

    /// Reject every subsequent placement (None restores normal behaviour)
    pub fn set_rejecting(&self, reason: Option<String>) {
        *self.reject_reason.lock() = reason;
    }

    /// Copy of every accepted request
    pub fn accepted_orders(&self) -> Vec<OrderRequest> {
        self.accepted.lock().clone()
    }

    /// Number of GTC limit orders currently resting
    pub fn resting_count(&self) -> usize {
        self.resting.lock().len()
    }

    fn consume_api(&self) -> ApiResult<()> {
        let mut bucket = self.api_bucket.lock();
        if bucket.try_consume(1) {
            Ok(())
        } else {
            Err(ApiError::RateLimited {
                remaining: bucket.remaining(),
            })
        }
    }

    fn consume_order(&self) -> ApiResult<()> {
        let mut bucket = self.order_bucket.lock();
        if bucket.try_consume(1) {
            Ok(())
        } else {
            Err(ApiError::RateLimited {
                remaining: bucket.remaining(),
            })
        }
    }

    async fn emit(&self, request: &OrderRequest, order_id: &str, kind: OrderEventKind) {
        let Some(publisher) = &self.events else {
            return;
        };
        let event = FeedEvent::order_status(
            request.market,
            OrderEvent::new(order_id, kind, Utc::now()),
        );
        if publisher.publish(event).await.is_err() {
            warn!("Order event for {} dropped: feed channel closed", order_id);
        }
    }
}

#[async_trait]
impl TradingApi for PaperTradingApi {
    async fn place_order(&self, request: &OrderRequest) -> ApiResult<OrderAck> {
        self.consume_api()?;

        let reject = self.reject_reason.lock().clone();
        if let Some(reason) = reject {
            warn!("Paper order rejected: {}", reason);
            return Err(ApiError::Rejected(reason));
        }
        if self.config.products.market_of(&request.product_code) != Some(request.market) {
            return Err(ApiError::Rejected(format!(
                "unknown product {} for {} market",
                request.product_code, request.market
            )));
        }
        if !request.validate() {
            return Err(ApiError::Rejected("invalid order parameters".to_string()));
        }
        self.consume_order()?;

        let order_id = format!("PAPER-{}", Uuid::new_v4().simple());
        info!(
            "Paper order accepted: {} {} {} {} @ {:?} ({})",
            order_id,
            request.product_code,
            request.order_type.as_str(),
            request.size,
            request.price,
            request.side
        );
        self.accepted.lock().push(request.clone());

        self.emit(
            request,
            &order_id,
            OrderEventKind::Opened {
                side: request.side,
                order_type: request.order_type,
                price: request.price,
                size: request.size,
            },
        )
        .await;

        let fills_now = request.order_type == OrderType::Market || !request.time_in_force.can_rest();
        if fills_now {
            self.emit(
                request,
                &order_id,
                OrderEventKind::Filled {
                    side: request.side,
                    price: request.price,
                    size: request.size,
                },
            )
            .await;
        } else {
            self.resting.lock().insert(order_id.clone(), request.clone());
        }

        Ok(OrderAck::new(order_id))
    }

    async fn cancel_all(&self, product_code: &str) -> ApiResult<()> {
        self.consume_api()?;

        let canceled: Vec<(String, OrderRequest)> = {
            let mut resting = self.resting.lock();
            let ids: Vec<String> = resting
                .iter()
                .filter(|(_, r)| r.product_code.eq_ignore_ascii_case(product_code))
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| resting.remove(&id).map(|r| (id, r)))
                .collect()
        };

        debug!("Paper cancel_all on {}: {} orders", product_code, canceled.len());
        for (order_id, request) in &canceled {
            self.emit(request, order_id, OrderEventKind::Canceled).await;
        }
        Ok(())
    }

    fn remaining_quota(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Api => self.api_bucket.lock().remaining(),
            QuotaKind::Orders => self.order_bucket.lock().remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::FeedPayload;
    use crate::transport::{Subscriber, feed_channel};
    use rust_decimal_macros::dec;
    use scalper_core::{Market, Side, TimeInForce};

    fn limit(side: Side) -> OrderRequest {
        OrderRequest::limit(
            Market::Margin,
            "FX_BTC_JPY",
            side,
            dec!(5000000),
            dec!(0.01),
            TimeInForce::GTC,
            1,
        )
    }

    fn kind_of(event: FeedEvent) -> OrderEventKind {
        match event.payload {
            FeedPayload::OrderStatus(ev) => ev.kind,
            other => panic!("expected order event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_market_order_opens_and_fills() {
        let (publisher, mut subscriber) = feed_channel(16);
        let api = PaperTradingApi::new(PaperConfig::default()).with_events(publisher);

        let request = OrderRequest::market(Market::Margin, "FX_BTC_JPY", Side::Buy, dec!(0.02), 1);
        let ack = api.place_order(&request).await.unwrap();
        assert!(ack.acceptance_id.starts_with("PAPER-"));

        assert!(matches!(
            kind_of(subscriber.next().await.unwrap()),
            OrderEventKind::Opened { size, .. } if size == dec!(0.02)
        ));
        assert!(matches!(
            kind_of(subscriber.next().await.unwrap()),
            OrderEventKind::Filled { side: Side::Buy, size, .. } if size == dec!(0.02)
        ));
        assert_eq!(api.resting_count(), 0);
    }

    #[tokio::test]
    async fn test_limit_orders_rest_until_cancel_all() {
        let (publisher, mut subscriber) = feed_channel(16);
        let api = PaperTradingApi::new(PaperConfig::default()).with_events(publisher);

        api.place_order(&limit(Side::Buy)).await.unwrap();
        api.place_order(&limit(Side::Sell)).await.unwrap();
        assert_eq!(api.resting_count(), 2);

        api.cancel_all("FX_BTC_JPY").await.unwrap();
        assert_eq!(api.resting_count(), 0);

        let mut cancels = 0;
        while let Ok(Some(event)) = subscriber.try_next() {
            if kind_of(event) == OrderEventKind::Canceled {
                cancels += 1;
            }
        }
        assert_eq!(cancels, 2);
    }

    #[tokio::test]
    async fn test_rejecting_mode() {
        let api = PaperTradingApi::new(PaperConfig::default());
        api.set_rejecting(Some("insufficient margin".to_string()));

        let result = api.place_order(&limit(Side::Buy)).await;
        assert_eq!(
            result,
            Err(ApiError::Rejected("insufficient margin".to_string()))
        );
        assert!(api.accepted_orders().is_empty());

        api.set_rejecting(None);
        assert!(api.place_order(&limit(Side::Buy)).await.is_ok());
    }

    #[tokio::test]
    async fn test_product_must_match_market() {
        let api = PaperTradingApi::new(PaperConfig::default());
        let mut request = limit(Side::Buy);
        request.product_code = "BTC_JPY".to_string();
        assert!(matches!(
            api.place_order(&request).await,
            Err(ApiError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_quota_counts_down_and_limits() {
        let config = PaperConfig {
            api_limit: 3,
            api_window: Duration::from_secs(3600),
            order_limit: 2,
            order_window: Duration::from_secs(3600),
            ..Default::default()
        };
        let api = PaperTradingApi::new(config);
        assert_eq!(api.remaining_quota(QuotaKind::Api), 3);
        assert_eq!(api.remaining_quota(QuotaKind::Orders), 2);

        api.place_order(&limit(Side::Buy)).await.unwrap();
        api.place_order(&limit(Side::Buy)).await.unwrap();
        assert_eq!(api.remaining_quota(QuotaKind::Orders), 0);

        let third = api.place_order(&limit(Side::Buy)).await;
        assert!(matches!(third, Err(ApiError::RateLimited { .. })));
        assert_eq!(api.remaining_quota(QuotaKind::Api), 0);
    }
}
