use std::fmt;

use async_trait::async_trait;

use jax::config::{Config, ConfigError};

use super::api_client::{api_requests, ApiClient, ApiError};
use crate::cli::args::Op;

/// List recorded deals
#[derive(Debug, clap::Args, Clone)]
pub struct Deals {}

#[derive(Debug, thiserror::Error)]
pub enum DealsError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
pub struct DealsOutput {
    deals: Vec<api_requests::DealSummary>,
}

impl fmt::Display for DealsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recorded deals:")?;
        if self.deals.is_empty() {
            writeln!(f, "  No deals recorded")?;
        }
        for deal in &self.deals {
            writeln!(f, "  {} [{}]", deal.proposal_cid, deal.state)?;
            writeln!(
                f,
                "    miner {} stores {} ({} bytes) for {} blocks at {}",
                deal.miner, deal.piece_ref, deal.size, deal.duration, deal.total_price
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl Op for Deals {
    type Error = DealsError;
    type Output = DealsOutput;

    async fn execute(&self) -> Result<Self::Output, Self::Error> {
        let config = Config::from_env_or_disk()?;
        let client = ApiClient::new(&config.remote_url()?)?;

        let response = client.call(api_requests::Deals).await?;

        Ok(DealsOutput {
            deals: response.deals,
        })
    }
}
