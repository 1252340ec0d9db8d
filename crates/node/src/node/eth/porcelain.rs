use alloy::{
    primitives::Address,
    providers::{Provider, ProviderBuilder, WsConnect},
    signers::local::PrivateKeySigner,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;
use iroh::NodeId;
use jax_deals::{Ask, CreatePaymentsParams, CreatePaymentsReturn, Deal, PorcelainApi};
use url::Url;

use super::contracts::{MarketContract, PaymentBrokerContract};
use super::vouchers::{sign_vouchers, voucher_schedule};
use crate::node::datastore::RedbDatastore;

/// Chain, wallet and deal listing backed by the market and broker contracts
#[derive(Clone)]
pub struct EthPorcelain {
    ws_url: Url,
    signer: PrivateKeySigner,
    default_wallet_address: Option<Address>,
    market: MarketContract,
    broker: PaymentBrokerContract,
    datastore: RedbDatastore,
}

impl EthPorcelain {
    pub fn new(
        ws_url: &Url,
        signer: PrivateKeySigner,
        market_address: Address,
        broker_address: Address,
        default_wallet_address: Option<Address>,
        datastore: RedbDatastore,
    ) -> Self {
        Self {
            ws_url: ws_url.clone(),
            market: MarketContract::new(market_address, ws_url, &signer),
            broker: PaymentBrokerContract::new(broker_address, ws_url, &signer),
            signer,
            default_wallet_address,
            datastore,
        }
    }
}

#[async_trait]
impl PorcelainApi for EthPorcelain {
    async fn default_wallet_address(&self) -> Result<Option<Address>> {
        Ok(self.default_wallet_address)
    }

    async fn chain_block_height(&self) -> Result<u64> {
        let provider = ProviderBuilder::new()
            .with_chain(alloy_chains::NamedChain::AnvilHardhat)
            .on_ws(WsConnect::new(self.ws_url.as_str()))
            .await?;
        Ok(provider.get_block_number().await?)
    }

    async fn create_payments(&self, params: CreatePaymentsParams) -> Result<CreatePaymentsReturn> {
        if params.from != self.signer.address() {
            return Err(anyhow!(
                "wallet {} is not managed by this node",
                params.from
            ));
        }

        // validate the schedule before locking any funds
        let height = self.chain_block_height().await?;
        let schedule = voucher_schedule(
            height,
            params.value,
            params.duration,
            params.payment_interval,
        )?;

        let opened = self
            .broker
            .create_channel(
                params.to,
                params.channel_expiry,
                params.value,
                params.gas_price,
                params.gas_limit,
            )
            .await?;
        tracing::debug!(channel = %opened.channel, tx = %opened.tx_hash, "channel created");

        let vouchers = sign_vouchers(&self.signer, opened.channel, params.to, &schedule)?;

        Ok(CreatePaymentsReturn {
            channel: opened.channel,
            channel_msg_cid: opened.tx_hash.to_string(),
            vouchers,
        })
    }

    async fn miner_get_ask(&self, miner: Address, ask_id: u64) -> Result<Ask> {
        self.market.get_ask(miner, ask_id).await
    }

    async fn miner_get_owner_address(&self, miner: Address) -> Result<Address> {
        self.market.get_owner(miner).await
    }

    async fn miner_get_peer_id(&self, miner: Address) -> Result<NodeId> {
        self.market.get_peer_id(miner).await
    }

    fn deals_ls(&self) -> BoxStream<'static, Result<Deal>> {
        self.datastore.deals()
    }
}
