use std::time::Duration;

use iroh_blobs::Hash;

use crate::deal::DealState;

/// Failures of a single request/response exchange with a peer
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("could not establish connection with peer. Peer does not support protocol")]
    ProtocolUnsupported,
    #[error("failed to establish connection with the peer: {0}")]
    Connect(#[source] anyhow::Error),
    #[error("failed to write request: {0}")]
    Write(#[source] anyhow::Error),
    #[error("failed to read response: {0}")]
    Read(#[source] anyhow::Error),
    #[error("peer closed the stream without responding")]
    NoResponse,
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
    #[error("request cancelled")]
    Cancelled,
}

/// Failures surfaced by the storage deal client
#[derive(Debug, thiserror::Error)]
pub enum DealError {
    #[error("failed to determine the size of the data: {0}")]
    FileSize(#[source] anyhow::Error),
    #[error("failed to get ask price: {0}")]
    Ask(#[source] anyhow::Error),
    #[error("failed to get chain height: {0}")]
    ChainHeight(#[source] anyhow::Error),
    #[error("failed to get default wallet address: {0}")]
    WalletAddress(#[source] anyhow::Error),
    #[error("wallet address not configured")]
    WalletNotConfigured,
    #[error("failed to get miner owner address: {0}")]
    OwnerAddress(#[source] anyhow::Error),
    #[error("failed to get miner peer id: {0}")]
    PeerId(#[source] anyhow::Error),
    #[error("total price overflows for size {size} and duration {duration}")]
    PriceOverflow { size: u64, duration: u64 },
    #[error("failed to get cid of proposal: {0}")]
    ProposalCid(#[source] bincode::Error),
    #[error("proposal is a duplicate of existing deal; if you would like to create a duplicate, add the --allow-duplicates flag")]
    Duplicate,
    #[error("could not find a unique proposal cid after {0} attempts")]
    DuplicateResolution(usize),
    #[error(transparent)]
    Payments(anyhow::Error),
    #[error("failed to encode message: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode message: {0}")]
    Decode(#[source] bincode::Error),
    #[error("error sending proposal: {0}")]
    SendProposal(#[source] ExchangeError),
    #[error("error querying deal: {0}")]
    QueryDeal(#[source] ExchangeError),
    #[error("deal rejected: {0}")]
    Rejected(String),
    #[error("deal failed: {0}")]
    Failed(String),
    #[error("invalid proposal response: {0}")]
    InvalidResponse(DealState),
    #[error("deal [{0}] is already in progress")]
    AlreadyInProgress(Hash),
    #[error("no such proposal by cid: {0}")]
    NoSuchProposal(Hash),
    #[error("could not save client deal to disk, in-memory deals differ from persisted deals!: {0}")]
    Persist(#[source] anyhow::Error),
    #[error("failed to load client deals: {0}")]
    Load(#[source] anyhow::Error),
}
