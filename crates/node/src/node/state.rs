use std::sync::Arc;

use alloy::primitives::Address;
use iroh::Endpoint;
use iroh::NodeId;
use iroh::SecretKey;
use jax_deals::{CancellationToken, Client};

use crate::config::{Config, ConfigError};

use super::datastore::RedbDatastore;
use super::eth::EthPorcelain;
use super::iroh::{await_relay_region, create_endpoint, BlobsService, IrohClientNode};

pub type DealClient = Client<IrohClientNode, EthPorcelain>;

#[derive(Clone)]
pub struct State {
    iroh_secret_key: SecretKey,
    wallet_address: Option<Address>,
    endpoint: Endpoint,
    blobs_service: BlobsService,
    deal_client: Arc<DealClient>,
    cancel: CancellationToken,
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("default error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("deal client error: {0}")]
    Deals(#[from] jax_deals::DealError),
}

impl State {
    pub async fn from_config(
        config: &Config,
        cancel: CancellationToken,
    ) -> Result<Self, StateSetupError> {
        let iroh_secret_key = config.iroh_secret_key()?;
        let endpoint =
            create_endpoint(*config.endpoint_listen_addr(), iroh_secret_key.clone()).await?;
        if let Err(e) = await_relay_region(&endpoint).await {
            tracing::warn!(error = %e, "continuing without a relay");
        }

        let blobs_service = BlobsService::load(config.blobs_path(), endpoint.clone()).await?;
        let datastore = RedbDatastore::open(config.deals_db_path())?;

        let porcelain = EthPorcelain::new(
            config.eth_ws_rpc_url(),
            config.eth_signer()?,
            *config.market_contract_address(),
            *config.payment_broker_address(),
            config.default_wallet_address(),
            datastore.clone(),
        );
        let client_node = IrohClientNode::new(
            endpoint.clone(),
            blobs_service.clone(),
            config.exchange_timeout(),
        );

        let deal_client = Client::new(
            client_node,
            porcelain,
            Arc::new(datastore),
            config.deal_params().clone(),
        )
        .await?;

        Ok(Self {
            iroh_secret_key,
            wallet_address: config.default_wallet_address(),
            endpoint,
            blobs_service,
            deal_client: Arc::new(deal_client),
            cancel,
        })
    }

    pub fn iroh_node_id(&self) -> NodeId {
        self.iroh_secret_key.public()
    }

    pub fn wallet_address(&self) -> Option<Address> {
        self.wallet_address
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn blobs_service(&self) -> &BlobsService {
        &self.blobs_service
    }

    pub fn deal_client(&self) -> &DealClient {
        &self.deal_client
    }

    /// Token for one request's exchanges, cancelled when the node shuts down
    pub fn request_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}
