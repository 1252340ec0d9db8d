//! The client's authoritative record of its deals

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use futures::stream::BoxStream;
use futures::StreamExt;
use iroh_blobs::Hash;
use tokio::sync::Mutex;

use crate::datastore::Datastore;
use crate::deal::{client_deal_key, Deal, PaymentVoucher, Proposal, Response};
use crate::error::DealError;
use crate::proposal::resolve_duplicates;

/// In-memory deal map mirrored into a [`Datastore`].
///
/// A single lock covers every read, insert and the disk write that follows
/// an insert.
pub struct DealStore {
    deals: Mutex<HashMap<Hash, Deal>>,
    datastore: Arc<dyn Datastore>,
}

impl DealStore {
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        Self {
            deals: Mutex::new(HashMap::new()),
            datastore,
        }
    }

    /// Replace the in-memory map with every deal in `stored`.
    ///
    /// The enumeration is drained to its end; the first error aborts the load.
    pub async fn load(&self, mut stored: BoxStream<'_, anyhow::Result<Deal>>) -> Result<usize, DealError> {
        let mut deals = self.deals.lock().await;
        deals.clear();
        while let Some(deal) = stored.next().await {
            let deal = deal.map_err(DealError::Load)?;
            deals.insert(deal.proposal_cid, deal);
        }
        tracing::info!(count = deals.len(), "loaded client deals");
        Ok(deals.len())
    }

    /// Settle on an identity for `proposal` that no recorded deal uses
    pub async fn unique_proposal(
        &self,
        proposal: Proposal,
        allow_duplicates: bool,
    ) -> Result<(Proposal, Hash), DealError> {
        let deals = self.deals.lock().await;
        resolve_duplicates(proposal, allow_duplicates, deals.len(), |cid| {
            deals.contains_key(cid)
        })
    }

    /// Record a deal and persist it.
    ///
    /// An existing entry is never overwritten. If the disk write fails the
    /// in-memory entry stays and the error says so.
    pub async fn record(
        &self,
        proposal_cid: Hash,
        miner: Address,
        proposal: Proposal,
        response: Response,
    ) -> Result<(), DealError> {
        let mut deals = self.deals.lock().await;
        if deals.contains_key(&proposal_cid) {
            return Err(DealError::AlreadyInProgress(proposal_cid));
        }

        let deal = Deal {
            miner,
            proposal_cid,
            proposal,
            response,
        };
        let datum = bincode::serialize(&deal).map_err(DealError::Encode)?;
        deals.insert(proposal_cid, deal);

        let key = client_deal_key(&proposal_cid);
        if let Err(e) = self.datastore.put(&key, datum).await {
            tracing::error!(proposal = %proposal_cid, error = %e, "failed to persist client deal");
            return Err(DealError::Persist(e));
        }
        Ok(())
    }

    pub async fn miner_for(&self, proposal_cid: &Hash) -> Result<Address, DealError> {
        self.deals
            .lock()
            .await
            .get(proposal_cid)
            .map(|deal| deal.miner)
            .ok_or(DealError::NoSuchProposal(*proposal_cid))
    }

    pub async fn get(&self, proposal_cid: &Hash) -> Option<Deal> {
        self.deals.lock().await.get(proposal_cid).cloned()
    }

    /// Snapshot of every recorded deal
    pub async fn deals(&self) -> Vec<Deal> {
        self.deals.lock().await.values().cloned().collect()
    }
}

/// Vouchers of the stored deal recorded under `deal_cid`, empty if there is
/// no such deal
pub async fn vouchers_in(
    mut stored: BoxStream<'_, anyhow::Result<Deal>>,
    deal_cid: &Hash,
) -> anyhow::Result<Vec<PaymentVoucher>> {
    let mut results = Vec::new();
    while let Some(deal) = stored.next().await {
        let deal = deal?;
        if deal.proposal_cid == *deal_cid {
            results.extend(deal.proposal.payment.vouchers);
        }
    }
    Ok(results)
}
