use alloy::primitives::Address;
use axum::extract::State;
use axum::Json;
use iroh::NodeId;
use serde::Serialize;

use crate::node::State as NodeState;

#[derive(Serialize)]
pub struct ReadinessResponse {
    node_id: NodeId,
    wallet_address: Option<Address>,
    deals: usize,
}

pub async fn handler(state: State<NodeState>) -> Json<ReadinessResponse> {
    let deals = state.deal_client().deals().await.len();
    Json(ReadinessResponse {
        node_id: state.iroh_node_id(),
        wallet_address: state.wallet_address(),
        deals,
    })
}
