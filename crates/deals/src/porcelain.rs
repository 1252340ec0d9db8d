use alloy_primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use iroh::NodeId;
use serde::{Deserialize, Serialize};

use crate::deal::{Ask, Deal, PaymentVoucher};

/// Parameters for funding a payment channel towards a miner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentsParams {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub duration: u64,
    pub payment_interval: u64,
    pub channel_expiry: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
}

/// A funded channel and the vouchers that release its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentsReturn {
    pub channel: U256,
    pub channel_msg_cid: String,
    pub vouchers: Vec<PaymentVoucher>,
}

/// Chain, wallet and deal-listing lookups the deal client depends on
#[async_trait]
pub trait PorcelainApi: Send + Sync {
    /// The wallet that funds deals, if one is configured
    async fn default_wallet_address(&self) -> Result<Option<Address>>;

    async fn chain_block_height(&self) -> Result<u64>;

    async fn create_payments(&self, params: CreatePaymentsParams) -> Result<CreatePaymentsReturn>;

    async fn miner_get_ask(&self, miner: Address, ask_id: u64) -> Result<Ask>;

    async fn miner_get_owner_address(&self, miner: Address) -> Result<Address>;

    /// Current peer identity of `miner`; callers must not cache it
    async fn miner_get_peer_id(&self, miner: Address) -> Result<NodeId>;

    /// Every deal in the client's persistent namespace. The stream ends when
    /// the enumeration is done; an error item terminates it early.
    fn deals_ls(&self) -> BoxStream<'static, Result<Deal>>;
}

#[async_trait]
impl<T: PorcelainApi + ?Sized> PorcelainApi for std::sync::Arc<T> {
    async fn default_wallet_address(&self) -> Result<Option<Address>> {
        (**self).default_wallet_address().await
    }

    async fn chain_block_height(&self) -> Result<u64> {
        (**self).chain_block_height().await
    }

    async fn create_payments(&self, params: CreatePaymentsParams) -> Result<CreatePaymentsReturn> {
        (**self).create_payments(params).await
    }

    async fn miner_get_ask(&self, miner: Address, ask_id: u64) -> Result<Ask> {
        (**self).miner_get_ask(miner, ask_id).await
    }

    async fn miner_get_owner_address(&self, miner: Address) -> Result<Address> {
        (**self).miner_get_owner_address(miner).await
    }

    async fn miner_get_peer_id(&self, miner: Address) -> Result<NodeId> {
        (**self).miner_get_peer_id(miner).await
    }

    fn deals_ls(&self) -> BoxStream<'static, Result<Deal>> {
        (**self).deals_ls()
    }
}
