use std::str::FromStr;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder, WsConnect},
    signers::local::PrivateKeySigner,
    sol,
};
use anyhow::{anyhow, Result};
use iroh::NodeId;
use jax_deals::Ask;
use url::Url;

sol! {
    #[sol(rpc)]
    contract StorageMarket {
        function getAsk(address miner, uint64 askId) external view returns (uint256 price, uint64 expiry);
        function getOwner(address miner) external view returns (address owner);
        function getPeerId(address miner) external view returns (string peerId);
    }
}

/// Read-only view of the storage market contract
#[derive(Clone)]
pub struct MarketContract {
    ws_url: Url,
    private_key: PrivateKeySigner,
    address: Address,
}

impl MarketContract {
    pub fn new(address: Address, ws_url: &Url, private_key: &PrivateKeySigner) -> Self {
        Self {
            address,
            ws_url: ws_url.clone(),
            private_key: private_key.clone(),
        }
    }

    async fn provider(&self) -> Result<impl Provider> {
        let provider = ProviderBuilder::new()
            .with_chain(alloy_chains::NamedChain::AnvilHardhat)
            .wallet(EthereumWallet::from(self.private_key.clone()))
            .on_ws(WsConnect::new(self.ws_url.as_str()))
            .await?;
        Ok(provider)
    }

    pub async fn get_ask(&self, miner: Address, ask_id: u64) -> Result<Ask> {
        let market = StorageMarket::new(self.address, self.provider().await?);
        let ask = market.getAsk(miner, ask_id).call().await?;
        if ask.price == U256::ZERO && ask.expiry == 0 {
            return Err(anyhow!("miner {} has no ask {}", miner, ask_id));
        }
        Ok(Ask {
            id: ask_id,
            price: ask.price,
            expiry: ask.expiry,
        })
    }

    pub async fn get_owner(&self, miner: Address) -> Result<Address> {
        let market = StorageMarket::new(self.address, self.provider().await?);
        let owner = market.getOwner(miner).call().await?.owner;
        if owner.is_zero() {
            return Err(anyhow!("miner {} is not registered", miner));
        }
        Ok(owner)
    }

    pub async fn get_peer_id(&self, miner: Address) -> Result<NodeId> {
        let market = StorageMarket::new(self.address, self.provider().await?);
        let peer_id = market.getPeerId(miner).call().await?.peerId;
        NodeId::from_str(&peer_id).map_err(|e| anyhow!("invalid peer id {:?}: {}", peer_id, e))
    }
}
