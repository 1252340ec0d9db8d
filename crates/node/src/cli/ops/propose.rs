use std::fmt;

use alloy::primitives::Address;
use async_trait::async_trait;
use iroh_blobs::Hash;
use jax_deals::Response;

use jax::config::{Config, ConfigError};

use super::api_client::{api_requests, ApiClient, ApiError};
use crate::cli::args::Op;

/// Propose a storage deal for locally held data
#[derive(Debug, clap::Args, Clone)]
pub struct Propose {
    /// Miner address
    miner: Address,
    /// Hash of the data to store
    data: Hash,
    /// Id of the miner's ask to accept
    ask_id: u64,
    /// Length of the deal in blocks
    duration: u64,
    /// Propose even if an identical deal exists
    #[arg(long, default_value_t = false)]
    allow_duplicates: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ProposeError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
pub struct ProposeOutput(Response);

impl fmt::Display for ProposeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deal {}", self.0.state)?;
        writeln!(f, "  proposal: {}", self.0.proposal_cid)?;
        if !self.0.message.is_empty() {
            writeln!(f, "  message: {}", self.0.message)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Op for Propose {
    type Error = ProposeError;
    type Output = ProposeOutput;

    async fn execute(&self) -> Result<Self::Output, Self::Error> {
        let config = Config::from_env_or_disk()?;
        let client = ApiClient::new(&config.remote_url()?)?;

        let request = api_requests::Propose {
            miner: self.miner,
            data: self.data,
            ask_id: self.ask_id,
            duration: self.duration,
            allow_duplicates: self.allow_duplicates,
        };
        let response = client.call(request).await?;

        Ok(ProposeOutput(response))
    }
}
