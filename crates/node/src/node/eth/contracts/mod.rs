mod market;
mod payment_broker;

pub use market::MarketContract;
pub use payment_broker::{OpenedChannel, PaymentBrokerContract};
