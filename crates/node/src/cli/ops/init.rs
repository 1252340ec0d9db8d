use alloy::primitives::Address;
use async_trait::async_trait;
use iroh::NodeId;
use url::Url;

use jax::config::{Config, ConfigError, InitOptions, OnDiskConfig};

use crate::cli::args::Op;

#[derive(Debug, clap::Args, Clone)]
pub struct Init {
    #[arg(short, long, default_value_t = false)]
    pub overwrite: bool,
    /// Address of the storage market contract
    #[arg(long)]
    pub market: Address,
    /// Address of the payment broker contract
    #[arg(long)]
    pub payment_broker: Address,
    /// Hex private key funding deals; generated when omitted
    #[arg(long)]
    pub eth_signer: Option<String>,
    #[arg(long)]
    pub eth_ws_rpc_url: Option<Url>,
    #[arg(long)]
    pub http_port: Option<u16>,
    #[arg(long)]
    pub iroh_port: Option<u16>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("default error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[async_trait]
impl Op for Init {
    type Error = InitError;
    type Output = (NodeId, Address);

    async fn execute(&self) -> Result<Self::Output, Self::Error> {
        OnDiskConfig::init(InitOptions {
            overwrite: self.overwrite,
            market_contract_address: self.market,
            payment_broker_address: self.payment_broker,
            eth_signer: self.eth_signer.clone(),
            eth_ws_rpc_url: self.eth_ws_rpc_url.clone(),
            http_port: self.http_port,
            iroh_port: self.iroh_port,
        })?;
        let config = Config::from_env_or_disk()?;
        let node_id = config.iroh_secret_key()?.public();
        let address = config.eth_signer()?.address();
        Ok((node_id, address))
    }
}
