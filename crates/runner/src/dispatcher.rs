//! Command dispatcher
//!
//! Turns operator commands into trading-API calls priced from the freshest
//! shared state. Every command leaves exactly one entry in the activity log;
//! failures are logged and never retried.

use log::{info, warn};
use rust_decimal::Decimal;
use scalper_core::{Market, OrderRequest, Price, ProductCodes, Quantity, Side, TimeInForce};
use scalper_ports::{ActivityLog, QuotaKind, TradingApi};
use scalper_state::SharedState;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    MarketBuy,
    MarketSell,
    /// Limit buy at the margin best bid
    LimitBuyAtBid,
    /// Limit sell at the margin best ask
    LimitSellAtAsk,
    /// Limit buy one offset below the margin best bid
    LimitBuyBelowBid,
    /// Limit sell one offset above the margin best ask
    LimitSellAboveAsk,
    /// Resting sell at the SFD threshold over spot
    SfdSell,
    /// IOC buy-back at the SFD threshold over spot
    SfdBuyBack,
    /// Market order closing the margin position
    Flatten,
    CancelAll,
    SizeUp,
    SizeDown,
    OffsetUp,
    OffsetDown,
}

impl Command {
    pub const ALL: [Command; 14] = [
        Command::MarketBuy,
        Command::MarketSell,
        Command::LimitBuyAtBid,
        Command::LimitSellAtAsk,
        Command::LimitBuyBelowBid,
        Command::LimitSellAboveAsk,
        Command::SfdSell,
        Command::SfdBuyBack,
        Command::Flatten,
        Command::CancelAll,
        Command::SizeUp,
        Command::SizeDown,
        Command::OffsetUp,
        Command::OffsetDown,
    ];

    /// Canonical text accepted by `FromStr`
    pub fn name(&self) -> &'static str {
        match self {
            Command::MarketBuy => "buy",
            Command::MarketSell => "sell",
            Command::LimitBuyAtBid => "bid",
            Command::LimitSellAtAsk => "ask",
            Command::LimitBuyBelowBid => "bid-offset",
            Command::LimitSellAboveAsk => "ask-offset",
            Command::SfdSell => "sfd-sell",
            Command::SfdBuyBack => "sfd-buyback",
            Command::Flatten => "flatten",
            Command::CancelAll => "cancel",
            Command::SizeUp => "size+",
            Command::SizeDown => "size-",
            Command::OffsetUp => "offset+",
            Command::OffsetDown => "offset-",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {0}")]
pub struct ParseCommandError(pub String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        let alias = match text.as_str() {
            "b" => Some(Command::MarketBuy),
            "s" => Some(Command::MarketSell),
            "f" => Some(Command::Flatten),
            "c" | "cancel-all" => Some(Command::CancelAll),
            _ => None,
        };
        alias
            .or_else(|| Command::ALL.into_iter().find(|c| c.name() == text))
            .ok_or_else(|| ParseCommandError(s.trim().to_string()))
    }
}

/// Dispatcher parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    pub products: ProductCodes,
    pub target_market: Market,
    pub trade_size: Quantity,
    pub size_step: Quantity,
    pub offset_ratio: Decimal,
    pub offset_ratio_step: Decimal,
    pub flatten_epsilon: Quantity,
    pub sfd_threshold: Decimal,
    pub price_tick: Decimal,
    pub expire_minutes: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            products: ProductCodes::default(),
            target_market: Market::Margin,
            trade_size: Decimal::new(1, 2),
            size_step: Decimal::new(1, 2),
            offset_ratio: Decimal::ZERO,
            offset_ratio_step: Decimal::new(1, 4),
            flatten_epsilon: Decimal::new(1, 2),
            sfd_threshold: Decimal::new(105, 2),
            price_tick: Decimal::ONE,
            expire_minutes: 1,
        }
    }
}

/// Operator-adjustable settings, published to the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeSettings {
    pub size: Quantity,
    /// Limit offset as a fraction of the margin LTP
    pub offset_ratio: Decimal,
}

/// What a command resolves to against the current state
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Place(OrderRequest),
    CancelAll { product_code: String },
    Adjust { settings: TradeSettings, message: String },
    /// Nothing is sent; the reason is logged
    Skip { reason: String, is_error: bool },
}

/// Outcome of one dispatched command
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Placed { acceptance_id: String },
    Canceled,
    Adjusted(TradeSettings),
    Skipped,
    Failed(String),
}

impl Dispatch {
    pub fn is_failure(&self) -> bool {
        matches!(self, Dispatch::Failed(_))
    }
}

/// Floor (buy) or ceil (sell) a price onto the tick grid
pub fn round_to_tick(price: Price, tick: Decimal, side: Side) -> Price {
    if tick <= Decimal::ZERO {
        return price;
    }
    let steps = price / tick;
    let steps = match side {
        Side::Buy => steps.floor(),
        Side::Sell => steps.ceil(),
    };
    steps * tick
}

pub struct CommandDispatcher {
    config: DispatchConfig,
    api: Arc<dyn TradingApi>,
    state: SharedState,
    log: Arc<dyn ActivityLog>,
    settings: TradeSettings,
    settings_tx: watch::Sender<TradeSettings>,
}

impl CommandDispatcher {
    pub fn new(
        config: DispatchConfig,
        api: Arc<dyn TradingApi>,
        state: SharedState,
        log: Arc<dyn ActivityLog>,
    ) -> Self {
        let settings = TradeSettings {
            size: config.trade_size,
            offset_ratio: config.offset_ratio,
        };
        let (settings_tx, _) = watch::channel(settings);
        Self {
            config,
            api,
            state,
            log,
            settings,
            settings_tx,
        }
    }

    pub fn settings(&self) -> TradeSettings {
        self.settings
    }

    /// Receiver that always holds the latest settings
    pub fn subscribe(&self) -> watch::Receiver<TradeSettings> {
        self.settings_tx.subscribe()
    }

    fn product_code(&self) -> &str {
        self.config.products.code(self.config.target_market)
    }

    fn market_order(&self, side: Side, size: Quantity) -> Plan {
        Plan::Place(OrderRequest::market(
            self.config.target_market,
            self.product_code(),
            side,
            size,
            self.config.expire_minutes,
        ))
    }

    fn limit_order(&self, side: Side, price: Price, tif: TimeInForce, what: &str) -> Plan {
        if price <= Decimal::ZERO {
            return Plan::Skip {
                reason: format!("{}: no reference price yet", what),
                is_error: true,
            };
        }
        Plan::Place(OrderRequest::limit(
            self.config.target_market,
            self.product_code(),
            side,
            price,
            self.settings.size,
            tif,
            self.config.expire_minutes,
        ))
    }

    /// Yen offset for the current ratio at the current margin LTP
    fn offset(&self, ratio: Decimal) -> Price {
        self.state.margin.last_trade_price() * ratio
    }

    /// Resolve a command against the current state without side effects
    pub fn plan(&self, command: Command) -> Plan {
        let size = self.settings.size;
        let tick = self.config.price_tick;

        match command {
            Command::MarketBuy => self.market_order(Side::Buy, size),
            Command::MarketSell => self.market_order(Side::Sell, size),
            Command::LimitBuyAtBid => {
                let (bid, _) = self.state.margin.top_of_book();
                self.limit_order(Side::Buy, bid, TimeInForce::GTC, "limit at bid")
            }
            Command::LimitSellAtAsk => {
                let (_, ask) = self.state.margin.top_of_book();
                self.limit_order(Side::Sell, ask, TimeInForce::GTC, "limit at ask")
            }
            Command::LimitBuyBelowBid => {
                let (bid, _) = self.state.margin.top_of_book();
                if bid.is_zero() {
                    return self.limit_order(Side::Buy, bid, TimeInForce::GTC, "limit below bid");
                }
                let offset = self.offset(self.settings.offset_ratio);
                let price = round_to_tick(bid - offset, tick, Side::Buy);
                self.limit_order(Side::Buy, price, TimeInForce::GTC, "limit below bid")
            }
            Command::LimitSellAboveAsk => {
                let (_, ask) = self.state.margin.top_of_book();
                if ask.is_zero() {
                    return self.limit_order(Side::Sell, ask, TimeInForce::GTC, "limit above ask");
                }
                let offset = self.offset(self.settings.offset_ratio);
                let price = round_to_tick(ask + offset, tick, Side::Sell);
                self.limit_order(Side::Sell, price, TimeInForce::GTC, "limit above ask")
            }
            Command::SfdSell => {
                let line = self.state.spot.last_trade_price() * self.config.sfd_threshold;
                let price = round_to_tick(line, tick, Side::Sell);
                self.limit_order(Side::Sell, price, TimeInForce::GTC, "sfd sell")
            }
            Command::SfdBuyBack => {
                let line = self.state.spot.last_trade_price() * self.config.sfd_threshold;
                let price = round_to_tick(line, tick, Side::Buy);
                self.limit_order(Side::Buy, price, TimeInForce::IOC, "sfd buy-back")
            }
            Command::Flatten => {
                let net = self.state.margin_orders.net_position();
                if net.abs() < self.config.flatten_epsilon {
                    return Plan::Skip {
                        reason: format!("flatten: position {} is flat", net),
                        is_error: false,
                    };
                }
                let side = if net > Decimal::ZERO { Side::Sell } else { Side::Buy };
                self.market_order(side, net.abs())
            }
            Command::CancelAll => Plan::CancelAll {
                product_code: self.product_code().to_string(),
            },
            Command::SizeUp => {
                let settings = TradeSettings {
                    size: size + self.config.size_step,
                    ..self.settings
                };
                Plan::Adjust {
                    message: format!("trade size up: {:.2}", settings.size),
                    settings,
                }
            }
            Command::SizeDown => {
                let settings = TradeSettings {
                    size: (size - self.config.size_step).max(self.config.size_step),
                    ..self.settings
                };
                Plan::Adjust {
                    message: format!("trade size down: {:.2}", settings.size),
                    settings,
                }
            }
            Command::OffsetUp => {
                let ratio = self.settings.offset_ratio + self.config.offset_ratio_step;
                let settings = TradeSettings {
                    offset_ratio: ratio,
                    ..self.settings
                };
                Plan::Adjust {
                    message: format!("trade limit diff up: ¥{:.0}", self.offset(ratio)),
                    settings,
                }
            }
            Command::OffsetDown => {
                let ratio = (self.settings.offset_ratio - self.config.offset_ratio_step)
                    .max(Decimal::ZERO);
                let settings = TradeSettings {
                    offset_ratio: ratio,
                    ..self.settings
                };
                Plan::Adjust {
                    message: format!("trade limit diff down: ¥{:.0}", self.offset(ratio)),
                    settings,
                }
            }
        }
    }

    /// Execute one command and record its outcome
    pub async fn dispatch(&mut self, command: Command) -> Dispatch {
        info!("Dispatching {}", command);

        match self.plan(command) {
            Plan::Place(request) => match self.api.place_order(&request).await {
                Ok(ack) => {
                    self.log.record(false, &ack.acceptance_id);
                    Dispatch::Placed {
                        acceptance_id: ack.acceptance_id,
                    }
                }
                Err(e) => {
                    warn!("{} failed: {}", command, e);
                    self.log.record(true, &e.to_string());
                    Dispatch::Failed(e.to_string())
                }
            },
            Plan::CancelAll { product_code } => match self.api.cancel_all(&product_code).await {
                Ok(()) => {
                    let message = format!(
                        "api limit: {}, orders: {}",
                        self.api.remaining_quota(QuotaKind::Api),
                        self.api.remaining_quota(QuotaKind::Orders)
                    );
                    self.log.record(false, &message);
                    Dispatch::Canceled
                }
                Err(e) => {
                    warn!("{} failed: {}", command, e);
                    self.log.record(true, &e.to_string());
                    Dispatch::Failed(e.to_string())
                }
            },
            Plan::Adjust { settings, message } => {
                self.settings = settings;
                self.settings_tx.send_replace(settings);
                self.log.record(false, &message);
                Dispatch::Adjusted(settings)
            }
            Plan::Skip { reason, is_error } => {
                self.log.record(is_error, &reason);
                Dispatch::Skipped
            }
        }
    }

    /// Consume commands until shutdown or until every sender is dropped.
    /// Returns the number of commands dispatched.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        shutdown: CancellationToken,
    ) -> u64 {
        info!("Command dispatcher started");
        let mut dispatched = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => {
                        self.dispatch(command).await;
                        dispatched += 1;
                    }
                    None => break,
                },
            }
        }

        info!("Command dispatcher stopped after {} commands", dispatched);
        dispatched
    }
}
