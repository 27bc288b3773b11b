mod market;
mod order;
mod order_status;
mod order_type;
mod side;
mod time_in_force;

pub use market::{Market, ProductCodes};
pub use order::{OrderAck, OrderRequest};
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use side::Side;
pub use time_in_force::TimeInForce;
