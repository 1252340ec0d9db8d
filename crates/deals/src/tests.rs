use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use iroh::{NodeId, SecretKey};
use iroh_blobs::Hash;

use super::*;

const HEIGHT: u64 = 42;

fn node_id(seed: u8) -> NodeId {
    SecretKey::from_bytes(&[seed; 32]).public()
}

struct Harness {
    client: Client<Arc<MockClientNode>, Arc<MockPorcelain>>,
    node: Arc<MockClientNode>,
    api: Arc<MockPorcelain>,
    datastore: Arc<MemoryDatastore>,
    wallet: Address,
    owner: Address,
    miner: Address,
    peer: NodeId,
    data: Hash,
}

fn porcelain(datastore: Arc<MemoryDatastore>, wallet: Option<Address>) -> MockPorcelain {
    let miner = MockMiner {
        owner: Address::repeat_byte(0x0e),
        peer: node_id(7),
        asks: vec![Ask {
            id: 1,
            price: U256::from(10),
            expiry: 10_000,
        }],
    };
    let api = MockPorcelain::new(datastore)
        .with_height(HEIGHT)
        .with_miner(Address::repeat_byte(0x4d), miner);
    match wallet {
        Some(wallet) => api.with_wallet(wallet),
        None => api,
    }
}

async fn harness_with(datastore: Arc<MemoryDatastore>, wallet: Option<Address>) -> Harness {
    let data = Hash::new(b"hello");
    let node = Arc::new(MockClientNode::new().with_file(data, 5));
    let api = Arc::new(porcelain(datastore.clone(), wallet));
    let client = Client::new(
        node.clone(),
        api.clone(),
        datastore.clone(),
        DealParams::default(),
    )
    .await
    .unwrap();

    Harness {
        client,
        node,
        api,
        datastore,
        wallet: wallet.unwrap_or_default(),
        owner: Address::repeat_byte(0x0e),
        miner: Address::repeat_byte(0x4d),
        peer: node_id(7),
        data,
    }
}

async fn harness() -> Harness {
    harness_with(
        Arc::new(MemoryDatastore::new()),
        Some(Address::repeat_byte(0xc1)),
    )
    .await
}

impl Harness {
    async fn propose(&self, allow_duplicates: bool) -> Result<Response, DealError> {
        self.client
            .propose_deal(
                &CancellationToken::new(),
                self.miner,
                self.data,
                1,
                3,
                allow_duplicates,
            )
            .await
    }
}

#[tokio::test]
async fn test_propose_deal_funds_and_records() {
    let h = harness().await;

    let response = h.propose(false).await.unwrap();
    assert_eq!(response.state, DealState::Accepted);

    // 10 per byte per block, 5 bytes, 3 blocks
    let payments = h.api.payments().await;
    assert_eq!(payments.len(), 1);
    let params = &payments[0];
    assert_eq!(params.from, h.wallet);
    assert_eq!(params.to, h.owner);
    assert_eq!(params.value, U256::from(150));
    assert_eq!(params.duration, 3);
    assert_eq!(params.payment_interval, VOUCHER_INTERVAL);
    assert_eq!(params.channel_expiry, HEIGHT + 3 + CHANNEL_EXPIRY_BUFFER);
    assert_eq!(params.gas_price, U256::ZERO);
    assert_eq!(params.gas_limit, CREATE_CHANNEL_GAS_LIMIT);

    let sent = h.node.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].alpn, MAKE_DEAL_ALPN);
    assert_eq!(sent[0].peer, h.peer);

    // what went over the wire carries the payment
    let proposal: Proposal = codec::decode(&sent[0].request).unwrap();
    assert_eq!(proposal.total_price, U256::from(150));
    assert_eq!(proposal.payment.channel, U256::from(1));
    assert_eq!(proposal.payment.channel_msg_cid, "msg-1");
    assert_eq!(proposal.payment.vouchers.len(), 1);

    let deals = h.client.deals().await;
    assert_eq!(deals.len(), 1);
    let deal = &deals[0];
    assert_eq!(deal.miner, h.miner);
    assert_eq!(deal.proposal, proposal);
    assert_eq!(deal.response, response);
    assert!(h.datastore.get(&client_deal_key(&deal.proposal_cid)).is_some());
}

#[tokio::test]
async fn test_duplicate_rejected_before_payment_or_network() {
    let h = harness().await;
    h.propose(false).await.unwrap();

    let err = h.propose(false).await.unwrap_err();
    assert!(matches!(err, DealError::Duplicate));
    assert_eq!(h.api.payments().await.len(), 1);
    assert_eq!(h.node.sent().await.len(), 1);
    assert_eq!(h.client.deals().await.len(), 1);
}

#[tokio::test]
async fn test_duplicates_resolved_when_allowed() {
    let h = harness().await;
    h.propose(false).await.unwrap();
    let first = h.client.deals().await.remove(0).proposal_cid;

    h.propose(true).await.unwrap();
    h.propose(true).await.unwrap();

    let deals = h.client.deals().await;
    assert_eq!(deals.len(), 3);
    let second = deals
        .iter()
        .find(|d| d.proposal.last_duplicate == Some(first.to_string()))
        .expect("second deal points at the first");
    let third = deals
        .iter()
        .find(|d| d.proposal.last_duplicate == Some(second.proposal_cid.to_string()))
        .expect("third deal points at the second");
    assert_ne!(third.proposal_cid, first);
    assert_ne!(third.proposal_cid, second.proposal_cid);
}

#[tokio::test]
async fn test_rejected_response_is_not_recorded() {
    let h = harness().await;
    h.node
        .set_peer(MockPeer::Answer {
            state: DealState::Rejected,
            message: "too cheap".to_string(),
        })
        .await;

    let err = h.propose(false).await.unwrap_err();
    match err {
        DealError::Rejected(message) => assert_eq!(message, "too cheap"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(h.client.deals().await.is_empty());
    assert!(h.datastore.is_empty());
}

#[tokio::test]
async fn test_failed_and_unknown_responses_are_not_recorded() {
    let h = harness().await;
    h.node
        .set_peer(MockPeer::Answer {
            state: DealState::Failed,
            message: "disk error".to_string(),
        })
        .await;
    let err = h.propose(false).await.unwrap_err();
    assert!(matches!(err, DealError::Failed(ref m) if m == "disk error"));

    h.node
        .set_peer(MockPeer::Answer {
            state: DealState::Started,
            message: String::new(),
        })
        .await;
    let err = h.propose(true).await.unwrap_err();
    assert!(matches!(err, DealError::InvalidResponse(DealState::Started)));
    assert_eq!(err.to_string(), "invalid proposal response: started");

    assert!(h.client.deals().await.is_empty());
    assert!(h.datastore.is_empty());
}

#[tokio::test]
async fn test_missing_wallet_is_reported() {
    let h = harness_with(Arc::new(MemoryDatastore::new()), None).await;
    let err = h.propose(false).await.unwrap_err();
    assert!(matches!(err, DealError::WalletNotConfigured));
    assert_eq!(err.to_string(), "wallet address not configured");

    let h = harness_with(Arc::new(MemoryDatastore::new()), Some(Address::ZERO)).await;
    let err = h.propose(false).await.unwrap_err();
    assert!(matches!(err, DealError::WalletNotConfigured));
    assert!(h.api.payments().await.is_empty());
}

#[tokio::test]
async fn test_lookup_failures_name_the_step() {
    let h = harness().await;

    let err = h
        .client
        .propose_deal(
            &CancellationToken::new(),
            h.miner,
            Hash::new(b"missing"),
            1,
            3,
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DealError::FileSize(_)));
    assert!(err.to_string().starts_with("failed to determine the size of the data"));

    let err = h
        .client
        .propose_deal(&CancellationToken::new(), h.miner, h.data, 99, 3, false)
        .await
        .unwrap_err();
    assert!(matches!(err, DealError::Ask(_)));

    let err = h
        .client
        .propose_deal(
            &CancellationToken::new(),
            Address::repeat_byte(0x99),
            h.data,
            1,
            3,
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DealError::Ask(_)));
    assert!(h.node.sent().await.is_empty());
}

#[tokio::test]
async fn test_payment_failure_sends_nothing() {
    let h = harness().await;
    h.api.fail_payments(true);

    let err = h.propose(false).await.unwrap_err();
    assert!(matches!(err, DealError::Payments(_)));
    assert_eq!(err.to_string(), "insufficient funds");
    assert!(h.node.sent().await.is_empty());
    assert!(h.client.deals().await.is_empty());
}

#[tokio::test]
async fn test_unsupported_protocol_is_distinguished() {
    let h = harness().await;
    h.node.set_peer(MockPeer::Unsupported).await;

    let err = h.propose(false).await.unwrap_err();
    assert!(matches!(
        err,
        DealError::SendProposal(ExchangeError::ProtocolUnsupported)
    ));
    assert!(h.client.deals().await.is_empty());
}

#[tokio::test]
async fn test_cancelled_exchange_does_not_hang() {
    let h = harness().await;
    h.node.set_peer(MockPeer::Stall).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        h.client
            .propose_deal(&cancel, h.miner, h.data, 1, 3, false),
    )
    .await
    .expect("cancellation must end the exchange");

    assert!(matches!(
        result,
        Err(DealError::SendProposal(ExchangeError::Cancelled))
    ));
    assert!(h.client.deals().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_records_on_one_cid() {
    let datastore = Arc::new(MemoryDatastore::new());
    let store = Arc::new(DealStore::new(datastore.clone()));

    let proposal = build_proposal(
        Address::repeat_byte(0x4d),
        Hash::new(b"hello"),
        5,
        U256::from(10),
        3,
    )
    .unwrap();
    let cid = proposal.cid().unwrap();
    let response = Response {
        state: DealState::Accepted,
        message: String::new(),
        proposal_cid: cid,
    };

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let proposal = proposal.clone();
        let response = response.clone();
        handles.push(tokio::spawn(async move {
            store
                .record(cid, Address::repeat_byte(0x4d), proposal, response)
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => successes += 1,
            Err(DealError::AlreadyInProgress(c)) => assert_eq!(c, cid),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(datastore.len(), 1);
}

#[tokio::test]
async fn test_deals_survive_reload() {
    let h = harness().await;
    h.propose(false).await.unwrap();
    h.propose(true).await.unwrap();
    h.propose(true).await.unwrap();

    let mut before = h.client.deals().await;
    before.sort_by_key(|d| d.proposal_cid.to_string());

    let reloaded = harness_with(h.datastore.clone(), Some(h.wallet)).await;
    let mut after = reloaded.client.deals().await;
    after.sort_by_key(|d| d.proposal_cid.to_string());

    assert_eq!(after.len(), 3);
    assert_eq!(before, after);

    // the reloaded client still knows what it proposed
    let err = reloaded.propose(false).await.unwrap_err();
    assert!(matches!(err, DealError::Duplicate));
}

#[tokio::test]
async fn test_persist_failure_keeps_memory_entry() {
    let h = harness().await;
    h.datastore.fail_puts(true);

    let err = h.propose(false).await.unwrap_err();
    assert!(matches!(err, DealError::Persist(_)));
    assert!(err.to_string().contains("in-memory deals differ from persisted deals"));

    assert_eq!(h.client.deals().await.len(), 1);
    assert!(h.datastore.is_empty());
}

#[tokio::test]
async fn test_load_failure_is_reported() {
    let datastore = Arc::new(MemoryDatastore::new());
    let api = Arc::new(porcelain(datastore.clone(), None));
    api.fail_listing(true);

    let result = Client::new(
        Arc::new(MockClientNode::new()),
        api,
        datastore,
        DealParams::default(),
    )
    .await;
    assert!(matches!(result, Err(DealError::Load(_))));
}

#[tokio::test]
async fn test_query_deal_asks_the_recorded_miner() {
    let h = harness().await;
    h.propose(false).await.unwrap();
    let cid = h.client.deals().await.remove(0).proposal_cid;

    h.node
        .set_peer(MockPeer::Answer {
            state: DealState::Staged,
            message: "sealing".to_string(),
        })
        .await;

    let response = h
        .client
        .query_deal(&CancellationToken::new(), cid)
        .await
        .unwrap();
    assert_eq!(response.state, DealState::Staged);
    assert_eq!(response.proposal_cid, cid);

    let sent = h.node.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].alpn, QUERY_DEAL_ALPN);
    assert_eq!(sent[1].peer, h.peer);
    let query: QueryRequest = codec::decode(&sent[1].request).unwrap();
    assert_eq!(query.cid, cid);

    // querying never changes what was recorded
    let deal = h.client.deal(&cid).await.unwrap();
    assert_eq!(deal.response.state, DealState::Accepted);
}

#[tokio::test]
async fn test_query_unknown_proposal() {
    let h = harness().await;
    let cid = Hash::new(b"nothing");

    let err = h
        .client
        .query_deal(&CancellationToken::new(), cid)
        .await
        .unwrap_err();
    assert!(matches!(err, DealError::NoSuchProposal(c) if c == cid));
    assert!(h.node.sent().await.is_empty());
}

#[tokio::test]
async fn test_vouchers_for_deal() {
    let h = harness().await;
    h.propose(false).await.unwrap();
    let deal = h.client.deals().await.remove(0);

    let vouchers = h
        .client
        .load_vouchers_for_deal(deal.proposal_cid)
        .await
        .unwrap();
    assert_eq!(vouchers, deal.proposal.payment.vouchers);
    assert_eq!(vouchers[0].amount, U256::from(150));
    assert_eq!(vouchers[0].target, h.owner);

    let none = h
        .client
        .load_vouchers_for_deal(Hash::new(b"nothing"))
        .await
        .unwrap();
    assert!(none.is_empty());

    h.api.fail_listing(true);
    let err = h
        .client
        .load_vouchers_for_deal(deal.proposal_cid)
        .await
        .unwrap_err();
    assert!(matches!(err, DealError::Load(_)));
}

#[tokio::test]
async fn test_seeded_deals_are_all_loaded() {
    let datastore = Arc::new(MemoryDatastore::new());
    for i in 0..4u64 {
        let proposal = build_proposal(
            Address::repeat_byte(0x4d),
            Hash::new(i.to_be_bytes()),
            i + 1,
            U256::from(2),
            10,
        )
        .unwrap();
        let proposal_cid = proposal.cid().unwrap();
        let deal = Deal {
            miner: Address::repeat_byte(0x4d),
            proposal_cid,
            proposal,
            response: Response {
                state: DealState::Accepted,
                message: String::new(),
                proposal_cid,
            },
        };
        seed_deal(&datastore, &deal).await.unwrap();
    }

    let h = harness_with(datastore, None).await;
    assert_eq!(h.client.deals().await.len(), 4);
}

#[tokio::test]
async fn test_framed_exchange_over_a_stream() {
    let (client_side, miner_side) = tokio::io::duplex(1024);
    let (client_read, client_write) = tokio::io::split(client_side);
    let (miner_read, miner_write) = tokio::io::split(miner_side);

    let miner = tokio::spawn(async move {
        let request = codec::read_frame(miner_read).await.unwrap();
        let query: QueryRequest = codec::decode(&request).unwrap();
        let response = Response {
            state: DealState::Complete,
            message: String::new(),
            proposal_cid: query.cid,
        };
        codec::write_frame(miner_write, codec::encode(&response).unwrap())
            .await
            .unwrap();
    });

    let cid = Hash::new(b"proposal");
    let request = codec::encode(&QueryRequest { cid }).unwrap();
    let bytes = codec::request_response(client_write, client_read, request)
        .await
        .unwrap();
    let response: Response = codec::decode(&bytes).unwrap();

    assert_eq!(response.state, DealState::Complete);
    assert_eq!(response.proposal_cid, cid);
    miner.await.unwrap();
}

#[tokio::test]
async fn test_closed_stream_is_a_read_failure() {
    let (client_side, miner_side) = tokio::io::duplex(1024);
    let (client_read, client_write) = tokio::io::split(client_side);

    // the miner reads the request and hangs up
    tokio::spawn(async move {
        let (miner_read, _miner_write) = tokio::io::split(miner_side);
        let _ = codec::read_frame(miner_read).await;
    });

    let request = codec::encode(&QueryRequest {
        cid: Hash::new(b"proposal"),
    })
    .unwrap();
    let err = codec::request_response(client_write, client_read, request)
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::NoResponse));
}
