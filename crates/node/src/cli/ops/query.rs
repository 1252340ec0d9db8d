use std::fmt;

use async_trait::async_trait;
use iroh_blobs::Hash;
use jax_deals::Response;

use jax::config::{Config, ConfigError};

use super::api_client::{api_requests, ApiClient, ApiError};
use crate::cli::args::Op;

/// Ask a deal's miner for its current state
#[derive(Debug, clap::Args, Clone)]
pub struct Query {
    /// Proposal cid returned when the deal was made
    #[clap(value_parser)]
    cid: Hash,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
pub struct QueryOutput(Response);

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0.proposal_cid, self.0.state)?;
        if !self.0.message.is_empty() {
            write!(f, " ({})", self.0.message)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Op for Query {
    type Error = QueryError;
    type Output = QueryOutput;

    async fn execute(&self) -> Result<Self::Output, Self::Error> {
        let config = Config::from_env_or_disk()?;
        let client = ApiClient::new(&config.remote_url()?)?;

        let response = client.call(api_requests::Query { cid: self.cid }).await?;

        Ok(QueryOutput(response))
    }
}
