use alloy::primitives::Address;
use async_trait::async_trait;

use iroh::NodeId;
use jax::config::{Config, ConfigError};

use super::api_client::{
    requests::{Liveness, Readiness},
    ApiClient, ApiError,
};

use crate::cli::args::Op;

#[derive(Debug, clap::Args, Clone)]
pub struct Status {}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone)]
pub struct StatusOutput {
    status: String,
    node_id: NodeId,
    wallet_address: Option<Address>,
    deals: usize,
}

impl std::fmt::Display for StatusOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let wallet = match self.wallet_address {
            Some(address) => address.to_string(),
            None => "not configured".to_string(),
        };
        write!(
            f,
            "Node Status: {}\n- Node ID: {}\n- Wallet: {}\n- Deals: {}",
            self.status, self.node_id, wallet, self.deals
        )
    }
}

#[async_trait]
impl Op for Status {
    type Error = StatusError;
    type Output = StatusOutput;

    async fn execute(&self) -> Result<Self::Output, Self::Error> {
        let config = Config::from_env_or_disk()?;
        let client = ApiClient::new(&config.remote_url()?)?;

        let liveness = client.call(Liveness).await?;
        let readiness = client.call(Readiness).await?;

        Ok(StatusOutput {
            status: liveness.status().to_string(),
            node_id: readiness.node_id,
            wallet_address: readiness.wallet_address,
            deals: readiness.deals,
        })
    }
}
