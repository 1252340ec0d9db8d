use std::fmt;

use async_trait::async_trait;
use iroh_blobs::Hash;
use jax_deals::PaymentVoucher;

use jax::config::{Config, ConfigError};

use super::api_client::{api_requests, ApiClient, ApiError};
use crate::cli::args::Op;

/// List the payment vouchers stored for a deal
#[derive(Debug, clap::Args, Clone)]
pub struct Vouchers {
    #[clap(value_parser)]
    cid: Hash,
}

#[derive(Debug, thiserror::Error)]
pub enum VouchersError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
pub struct VouchersOutput {
    cid: Hash,
    vouchers: Vec<PaymentVoucher>,
}

impl fmt::Display for VouchersOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vouchers for deal {}", self.cid)?;
        if self.vouchers.is_empty() {
            writeln!(f, "  No vouchers stored")?;
        }
        for voucher in &self.vouchers {
            writeln!(
                f,
                "  channel {} pays {} to {} at height {}",
                voucher.channel, voucher.amount, voucher.target, voucher.valid_at
            )?;
        }
        Ok(())
    }
}

#[async_trait]
impl Op for Vouchers {
    type Error = VouchersError;
    type Output = VouchersOutput;

    async fn execute(&self) -> Result<Self::Output, Self::Error> {
        let config = Config::from_env_or_disk()?;
        let client = ApiClient::new(&config.remote_url()?)?;

        let vouchers = client
            .call(api_requests::Vouchers { cid: self.cid })
            .await?;

        Ok(VouchersOutput {
            cid: self.cid,
            vouchers,
        })
    }
}
