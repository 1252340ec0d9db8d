use alloy::primitives::{Address, U256};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use iroh_blobs::Hash;
use jax_deals::{Deal, DealState};
use serde::Serialize;

use crate::node::State as NodeState;

#[derive(Serialize)]
pub struct DealSummary {
    proposal_cid: Hash,
    miner: Address,
    piece_ref: Hash,
    size: u64,
    duration: u64,
    total_price: U256,
    channel: U256,
    state: DealState,
    message: String,
}

impl From<Deal> for DealSummary {
    fn from(deal: Deal) -> Self {
        Self {
            proposal_cid: deal.proposal_cid,
            miner: deal.miner,
            piece_ref: deal.proposal.piece_ref,
            size: deal.proposal.size,
            duration: deal.proposal.duration,
            total_price: deal.proposal.total_price,
            channel: deal.proposal.payment.channel,
            state: deal.response.state,
            message: deal.response.message,
        }
    }
}

#[derive(Serialize)]
pub struct DealsResponse {
    deals: Vec<DealSummary>,
}

/// Every deal this node has recorded, as last answered by its miner
pub async fn handler(State(state): State<NodeState>) -> impl IntoResponse {
    let mut deals = state.deal_client().deals().await;
    deals.sort_by_key(|deal| deal.proposal_cid.to_string());

    let response = DealsResponse {
        deals: deals.into_iter().map(DealSummary::from).collect(),
    };
    (StatusCode::OK, Json(response))
}
