//! Wire and storage types for storage deals

use std::fmt;

use alloy_primitives::{Address, U256};
use iroh_blobs::Hash;
use serde::{Deserialize, Serialize};

/// Namespace under which the client persists its deals
pub const CLIENT_DATASTORE_PREFIX: &str = "client";

/// Build the datastore key for a deal recorded under `proposal_cid`
pub fn client_deal_key(proposal_cid: &Hash) -> String {
    format!("/{}/{}", CLIENT_DATASTORE_PREFIX, proposal_cid)
}

/// A payment channel voucher redeemable by the miner once the chain
/// reaches `valid_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVoucher {
    pub channel: U256,
    pub payer: Address,
    pub target: Address,
    pub amount: U256,
    pub valid_at: u64,
    pub signature: Vec<u8>,
}

/// Funding attached to a proposal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub channel: U256,
    pub channel_msg_cid: String,
    pub vouchers: Vec<PaymentVoucher>,
}

/// What a client sends a miner when asking it to store data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub piece_ref: Hash,
    pub size: u64,
    pub total_price: U256,
    pub duration: u64,
    pub miner_address: Address,
    pub payment: PaymentInfo,
    pub last_duplicate: Option<String>,
}

impl Proposal {
    /// Content identity of the proposal: a blake3 hash over its canonical
    /// bincode encoding. Every field, `last_duplicate` included, feeds the hash.
    pub fn cid(&self) -> Result<Hash, bincode::Error> {
        let bytes = bincode::serialize(self)?;
        Ok(Hash::new(bytes))
    }
}

/// Lifecycle state reported by a miner for a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealState {
    Unset,
    Unknown,
    Rejected,
    Accepted,
    Started,
    Failed,
    Staged,
    Complete,
    Posted,
}

impl fmt::Display for DealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DealState::Unset => "unset",
            DealState::Unknown => "unknown",
            DealState::Rejected => "rejected",
            DealState::Accepted => "accepted",
            DealState::Started => "started",
            DealState::Failed => "failed",
            DealState::Staged => "staged",
            DealState::Complete => "complete",
            DealState::Posted => "posted",
        };
        write!(f, "{}", s)
    }
}

/// A miner's answer to a proposal or a deal query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub state: DealState,
    pub message: String,
    pub proposal_cid: Hash,
}

/// Asks a miner for the current state of a proposal it has seen before
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub cid: Hash,
}

/// The client's durable record of a negotiation.
///
/// `proposal_cid` is the identity the deal was recorded under; it is computed
/// before payment is attached, so it is carried alongside the proposal rather
/// than recomputed on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub miner: Address,
    pub proposal_cid: Hash,
    pub proposal: Proposal,
    pub response: Response,
}

/// A miner's posted price quotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ask {
    pub id: u64,
    pub price: U256,
    pub expiry: u64,
}
