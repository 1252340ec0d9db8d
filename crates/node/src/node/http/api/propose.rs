use alloy::primitives::Address;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use iroh_blobs::Hash;
use jax_deals::DealError;
use serde::Deserialize;

use super::error::{deal_error_status, error_response};
use crate::node::State as NodeState;

#[derive(Deserialize)]
pub struct ProposeRequest {
    miner: Address,
    data: Hash,
    ask_id: u64,
    duration: u64,
    #[serde(default)]
    allow_duplicates: bool,
}

pub async fn handler(
    State(state): State<NodeState>,
    Json(request): Json<ProposeRequest>,
) -> Result<impl IntoResponse, ProposeError> {
    let cancel = state.request_token();
    let response = state
        .deal_client()
        .propose_deal(
            &cancel,
            request.miner,
            request.data,
            request.ask_id,
            request.duration,
            request.allow_duplicates,
        )
        .await?;

    Ok((axum::http::StatusCode::OK, Json(response)))
}

#[derive(Debug, thiserror::Error)]
pub enum ProposeError {
    #[error(transparent)]
    Deal(#[from] DealError),
}

impl IntoResponse for ProposeError {
    fn into_response(self) -> Response {
        match self {
            ProposeError::Deal(e) => {
                let status = deal_error_status(&e);
                if status.is_server_error() {
                    tracing::error!(error = %e, "proposal failed");
                }
                error_response(status, e.to_string())
            }
        }
    }
}
