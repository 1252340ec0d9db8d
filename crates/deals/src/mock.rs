use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use iroh::NodeId;
use iroh_blobs::Hash;
use tokio::sync::Mutex;

use crate::alpn::{MAKE_DEAL_ALPN, QUERY_DEAL_ALPN};
use crate::client_node::ClientNode;
use crate::codec;
use crate::datastore::Datastore;
use crate::deal::{client_deal_key, Ask, Deal, DealState, PaymentVoucher, Proposal, QueryRequest, Response, CLIENT_DATASTORE_PREFIX};
use crate::error::ExchangeError;
use crate::porcelain::{CreatePaymentsParams, CreatePaymentsReturn, PorcelainApi};

/// How a mocked miner peer behaves when contacted
#[derive(Debug, Clone)]
pub enum MockPeer {
    /// Answer every request with `state` for the proposal it names
    Answer { state: DealState, message: String },
    /// Refuse the protocol at connection time
    Unsupported,
    /// Accept the stream but never answer
    Stall,
}

/// A request the mocked node was asked to send
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub alpn: &'static [u8],
    pub peer: NodeId,
    pub request: Bytes,
}

/// In-memory content store and scripted miner peers
pub struct MockClientNode {
    sizes: HashMap<Hash, u64>,
    peer: Mutex<MockPeer>,
    sent: Mutex<Vec<SentRequest>>,
}

impl Default for MockClientNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClientNode {
    pub fn new() -> Self {
        Self {
            sizes: HashMap::new(),
            peer: Mutex::new(MockPeer::Answer {
                state: DealState::Accepted,
                message: String::new(),
            }),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_file(mut self, data: Hash, size: u64) -> Self {
        self.sizes.insert(data, size);
        self
    }

    pub async fn set_peer(&self, peer: MockPeer) {
        *self.peer.lock().await = peer;
    }

    pub async fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().await.clone()
    }

    fn answer(alpn: &[u8], request: &[u8], state: DealState, message: String) -> Result<Bytes, ExchangeError> {
        let proposal_cid = if alpn == MAKE_DEAL_ALPN {
            let proposal: Proposal =
                codec::decode(request).map_err(|e| ExchangeError::Read(e.into()))?;
            proposal.cid().map_err(|e| ExchangeError::Read(e.into()))?
        } else if alpn == QUERY_DEAL_ALPN {
            let query: QueryRequest =
                codec::decode(request).map_err(|e| ExchangeError::Read(e.into()))?;
            query.cid
        } else {
            return Err(ExchangeError::ProtocolUnsupported);
        };

        let response = Response {
            state,
            message,
            proposal_cid,
        };
        codec::encode(&response).map_err(|e| ExchangeError::Read(e.into()))
    }
}

#[async_trait]
impl ClientNode for MockClientNode {
    async fn get_file_size(&self, data: &Hash) -> Result<u64> {
        self.sizes
            .get(data)
            .copied()
            .ok_or_else(|| anyhow!("blob not found: {}", data))
    }

    async fn make_protocol_request(
        &self,
        alpn: &'static [u8],
        peer: NodeId,
        request: Bytes,
    ) -> Result<Bytes, ExchangeError> {
        self.sent.lock().await.push(SentRequest {
            alpn,
            peer,
            request: request.clone(),
        });

        let behaviour = self.peer.lock().await.clone();
        match behaviour {
            MockPeer::Answer { state, message } => Self::answer(alpn, &request, state, message),
            MockPeer::Unsupported => Err(ExchangeError::ProtocolUnsupported),
            MockPeer::Stall => futures::future::pending().await,
        }
    }
}

/// Datastore held in memory, able to simulate failing writes
#[derive(Default)]
pub struct MemoryDatastore {
    entries: StdMutex<BTreeMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode every stored client deal
    pub fn deals(&self) -> Result<Vec<Deal>> {
        let prefix = format!("/{}/", CLIENT_DATASTORE_PREFIX);
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("datastore lock poisoned"))?;
        entries
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, value)| bincode::deserialize(value).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(anyhow!("disk full"));
        }
        self.entries
            .lock()
            .map_err(|_| anyhow!("datastore lock poisoned"))?
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// A miner known to [`MockPorcelain`]
#[derive(Debug, Clone)]
pub struct MockMiner {
    pub owner: Address,
    pub peer: NodeId,
    pub asks: Vec<Ask>,
}

/// Scripted chain and wallet, listing deals out of a [`MemoryDatastore`]
pub struct MockPorcelain {
    wallet: Option<Address>,
    height: u64,
    miners: HashMap<Address, MockMiner>,
    datastore: Arc<MemoryDatastore>,
    fail_payments: AtomicBool,
    fail_listing: AtomicBool,
    payments: Mutex<Vec<CreatePaymentsParams>>,
}

impl MockPorcelain {
    pub fn new(datastore: Arc<MemoryDatastore>) -> Self {
        Self {
            wallet: None,
            height: 0,
            miners: HashMap::new(),
            datastore,
            fail_payments: AtomicBool::new(false),
            fail_listing: AtomicBool::new(false),
            payments: Mutex::new(Vec::new()),
        }
    }

    pub fn with_wallet(mut self, wallet: Address) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_height(mut self, height: u64) -> Self {
        self.height = height;
        self
    }

    pub fn with_miner(mut self, address: Address, miner: MockMiner) -> Self {
        self.miners.insert(address, miner);
        self
    }

    pub fn fail_payments(&self, fail: bool) {
        self.fail_payments.store(fail, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Every channel creation requested so far
    pub async fn payments(&self) -> Vec<CreatePaymentsParams> {
        self.payments.lock().await.clone()
    }

    fn miner(&self, address: &Address) -> Result<&MockMiner> {
        self.miners
            .get(address)
            .ok_or_else(|| anyhow!("unknown miner: {}", address))
    }
}

#[async_trait]
impl PorcelainApi for MockPorcelain {
    async fn default_wallet_address(&self) -> Result<Option<Address>> {
        Ok(self.wallet)
    }

    async fn chain_block_height(&self) -> Result<u64> {
        Ok(self.height)
    }

    async fn create_payments(&self, params: CreatePaymentsParams) -> Result<CreatePaymentsReturn> {
        if self.fail_payments.load(Ordering::SeqCst) {
            return Err(anyhow!("insufficient funds"));
        }

        let mut payments = self.payments.lock().await;
        payments.push(params.clone());
        let channel = U256::from(payments.len());

        let voucher = PaymentVoucher {
            channel,
            payer: params.from,
            target: params.to,
            amount: params.value,
            valid_at: self.height + params.duration,
            signature: vec![0xaa; 65],
        };

        Ok(CreatePaymentsReturn {
            channel,
            channel_msg_cid: format!("msg-{}", payments.len()),
            vouchers: vec![voucher],
        })
    }

    async fn miner_get_ask(&self, miner: Address, ask_id: u64) -> Result<Ask> {
        self.miner(&miner)?
            .asks
            .iter()
            .find(|ask| ask.id == ask_id)
            .cloned()
            .ok_or_else(|| anyhow!("no ask {} for miner {}", ask_id, miner))
    }

    async fn miner_get_owner_address(&self, miner: Address) -> Result<Address> {
        Ok(self.miner(&miner)?.owner)
    }

    async fn miner_get_peer_id(&self, miner: Address) -> Result<NodeId> {
        Ok(self.miner(&miner)?.peer)
    }

    fn deals_ls(&self) -> BoxStream<'static, Result<Deal>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return stream::once(async { Err(anyhow!("datastore query failed")) }).boxed();
        }
        match self.datastore.deals() {
            Ok(deals) => stream::iter(deals.into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }
}

/// Store a deal directly in `datastore`, bypassing any client
pub async fn seed_deal(datastore: &MemoryDatastore, deal: &Deal) -> Result<()> {
    let key = client_deal_key(&deal.proposal_cid);
    datastore.put(&key, bincode::serialize(deal)?).await
}
