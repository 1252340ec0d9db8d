use std::sync::Arc;

use alloy_primitives::{Address, U256};
use iroh::NodeId;
use iroh_blobs::Hash;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::alpn::{MAKE_DEAL_ALPN, QUERY_DEAL_ALPN};
use crate::client_node::ClientNode;
use crate::codec;
use crate::datastore::Datastore;
use crate::deal::{Deal, DealState, PaymentVoucher, Proposal, QueryRequest, Response};
use crate::error::{DealError, ExchangeError};
use crate::porcelain::{CreatePaymentsParams, PorcelainApi};
use crate::proposal::build_proposal;
use crate::store::{vouchers_in, DealStore};

/// How many blocks pass before a new voucher becomes valid
pub const VOUCHER_INTERVAL: u64 = 1000;

/// How long the channel remains open past the last voucher
pub const CHANNEL_EXPIRY_BUFFER: u64 = 2000;

/// Gas price of the message that creates the payment channel
pub const CREATE_CHANNEL_GAS_PRICE: u64 = 0;

/// Gas limit of the message that creates the payment channel
pub const CREATE_CHANNEL_GAS_LIMIT: u64 = 300;

/// Payment terms attached to every proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealParams {
    pub voucher_interval: u64,
    pub channel_expiry_buffer: u64,
    pub create_channel_gas_price: U256,
    pub create_channel_gas_limit: u64,
}

impl Default for DealParams {
    fn default() -> Self {
        Self {
            voucher_interval: VOUCHER_INTERVAL,
            channel_expiry_buffer: CHANNEL_EXPIRY_BUFFER,
            create_channel_gas_price: U256::from(CREATE_CHANNEL_GAS_PRICE),
            create_channel_gas_limit: CREATE_CHANNEL_GAS_LIMIT,
        }
    }
}

/// Makes deals directly with storage miners
pub struct Client<N, P> {
    store: DealStore,
    node: N,
    api: P,
    params: DealParams,
}

impl<N, P> Client<N, P>
where
    N: ClientNode,
    P: PorcelainApi,
{
    /// Create a client and load its deals from `api`'s enumeration
    pub async fn new(
        node: N,
        api: P,
        datastore: Arc<dyn Datastore>,
        params: DealParams,
    ) -> Result<Self, DealError> {
        let store = DealStore::new(datastore);
        store.load(api.deals_ls()).await?;
        Ok(Self {
            store,
            node,
            api,
            params,
        })
    }

    pub fn params(&self) -> &DealParams {
        &self.params
    }

    /// Propose storing `data` with `miner` at the price of ask `ask_id` for
    /// `duration` blocks.
    ///
    /// Returns the miner's response once it has accepted and the deal has
    /// been recorded. Cancelling `cancel` aborts the exchange with the miner.
    ///
    /// The duplicate check and the final record each take the store lock, but
    /// payment and the exchange run between them without it. Two identical
    /// proposals racing through that window can both fund a channel; the
    /// later one then fails with [`DealError::AlreadyInProgress`] after its
    /// funds are locked.
    pub async fn propose_deal(
        &self,
        cancel: &CancellationToken,
        miner: Address,
        data: Hash,
        ask_id: u64,
        duration: u64,
        allow_duplicates: bool,
    ) -> Result<Response, DealError> {
        let size = self
            .node
            .get_file_size(&data)
            .await
            .map_err(DealError::FileSize)?;

        let ask = self
            .api
            .miner_get_ask(miner, ask_id)
            .await
            .map_err(DealError::Ask)?;

        let chain_height = self
            .api
            .chain_block_height()
            .await
            .map_err(DealError::ChainHeight)?;

        let from = self
            .api
            .default_wallet_address()
            .await
            .map_err(DealError::WalletAddress)?;
        let from = match from {
            Some(address) if !address.is_zero() => address,
            _ => return Err(DealError::WalletNotConfigured),
        };

        let miner_owner = self
            .api
            .miner_get_owner_address(miner)
            .await
            .map_err(DealError::OwnerAddress)?;

        let proposal = build_proposal(miner, data, size, ask.price, duration)?;
        tracing::debug!(%miner, %data, size, price = %proposal.total_price, duration, "built proposal");

        // check for duplicate deal prior to creating payment info
        let (mut proposal, proposal_cid) = self
            .store
            .unique_proposal(proposal, allow_duplicates)
            .await?;

        let payments = self
            .api
            .create_payments(CreatePaymentsParams {
                from,
                to: miner_owner,
                value: proposal.total_price,
                duration,
                payment_interval: self.params.voucher_interval,
                channel_expiry: channel_expiry(chain_height, duration, &self.params),
                gas_price: self.params.create_channel_gas_price,
                gas_limit: self.params.create_channel_gas_limit,
            })
            .await
            .map_err(DealError::Payments)?;
        tracing::info!(
            proposal = %proposal_cid,
            channel = %payments.channel,
            vouchers = payments.vouchers.len(),
            "created payment channel"
        );

        proposal.payment.channel = payments.channel;
        proposal.payment.channel_msg_cid = payments.channel_msg_cid;
        proposal.payment.vouchers = payments.vouchers;

        let peer = self
            .api
            .miner_get_peer_id(miner)
            .await
            .map_err(DealError::PeerId)?;

        let request = codec::encode(&proposal).map_err(DealError::Encode)?;
        let response = self
            .exchange(cancel, MAKE_DEAL_ALPN, peer, request)
            .await
            .map_err(DealError::SendProposal)?;
        let response: Response = codec::decode(&response).map_err(DealError::Decode)?;

        check_deal_response(&response)?;

        // the miner requests the data out of band
        self.store
            .record(proposal_cid, miner, proposal, response.clone())
            .await?;
        tracing::info!(proposal = %proposal_cid, %miner, "deal accepted");

        Ok(response)
    }

    /// Ask the miner of a recorded proposal for its current state
    pub async fn query_deal(
        &self,
        cancel: &CancellationToken,
        proposal_cid: Hash,
    ) -> Result<Response, DealError> {
        let miner = self.store.miner_for(&proposal_cid).await?;
        let peer = self
            .api
            .miner_get_peer_id(miner)
            .await
            .map_err(DealError::PeerId)?;

        let request = codec::encode(&QueryRequest { cid: proposal_cid }).map_err(DealError::Encode)?;
        let response = self
            .exchange(cancel, QUERY_DEAL_ALPN, peer, request)
            .await
            .map_err(DealError::QueryDeal)?;

        codec::decode(&response).map_err(DealError::Decode)
    }

    /// Load the vouchers stored for a deal
    pub async fn load_vouchers_for_deal(
        &self,
        deal_cid: Hash,
    ) -> Result<Vec<PaymentVoucher>, DealError> {
        vouchers_in(self.api.deals_ls(), &deal_cid)
            .await
            .map_err(DealError::Load)
    }

    /// Every deal this client has recorded
    pub async fn deals(&self) -> Vec<Deal> {
        self.store.deals().await
    }

    pub async fn deal(&self, proposal_cid: &Hash) -> Option<Deal> {
        self.store.get(proposal_cid).await
    }

    async fn exchange(
        &self,
        cancel: &CancellationToken,
        alpn: &'static [u8],
        peer: NodeId,
        request: bytes::Bytes,
    ) -> Result<bytes::Bytes, ExchangeError> {
        tracing::debug!(%peer, alpn = %String::from_utf8_lossy(alpn), "sending request");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExchangeError::Cancelled),
            response = self.node.make_protocol_request(alpn, peer, request) => response,
        }
    }
}

/// Height past which the channel for a deal of `duration` may be reclaimed
pub fn channel_expiry(chain_height: u64, duration: u64, params: &DealParams) -> u64 {
    chain_height
        .saturating_add(duration)
        .saturating_add(params.channel_expiry_buffer)
}

/// Only accepted proposals may be recorded
pub fn check_deal_response(response: &Response) -> Result<(), DealError> {
    match response.state {
        DealState::Accepted => Ok(()),
        DealState::Rejected => {
            tracing::warn!(proposal = %response.proposal_cid, message = %response.message, "deal rejected");
            Err(DealError::Rejected(response.message.clone()))
        }
        DealState::Failed => {
            tracing::warn!(proposal = %response.proposal_cid, message = %response.message, "deal failed");
            Err(DealError::Failed(response.message.clone()))
        }
        state => Err(DealError::InvalidResponse(state)),
    }
}
