//! Client side of the jax storage deal protocol

mod alpn;
mod client;
mod client_node;
pub mod codec;
mod datastore;
mod deal;
mod error;
mod mock;
mod porcelain;
mod proposal;
mod store;

#[cfg(test)]
mod tests;

pub use alpn::*;
pub use client::{
    channel_expiry, check_deal_response, Client, DealParams, CHANNEL_EXPIRY_BUFFER,
    CREATE_CHANNEL_GAS_LIMIT, CREATE_CHANNEL_GAS_PRICE, VOUCHER_INTERVAL,
};
pub use client_node::ClientNode;
pub use datastore::Datastore;
pub use deal::{
    client_deal_key, Ask, Deal, DealState, PaymentInfo, PaymentVoucher, Proposal, QueryRequest,
    Response, CLIENT_DATASTORE_PREFIX,
};
pub use error::{DealError, ExchangeError};
pub use mock::{seed_deal, MemoryDatastore, MockClientNode, MockMiner, MockPeer, MockPorcelain, SentRequest};
pub use porcelain::{CreatePaymentsParams, CreatePaymentsReturn, PorcelainApi};
pub use proposal::{build_proposal, resolve_duplicates, total_price};
pub use store::{vouchers_in, DealStore};

pub use tokio_util::sync::CancellationToken;
