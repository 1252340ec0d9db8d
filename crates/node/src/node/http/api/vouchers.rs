use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jax_deals::DealError;

use super::error::{deal_error_status, error_response, parse_cid};
use crate::node::State as NodeState;

pub async fn handler(
    State(state): State<NodeState>,
    Path(cid): Path<String>,
) -> Result<impl IntoResponse, VouchersError> {
    let cid = parse_cid(&cid).map_err(VouchersError::InvalidCid)?;
    let vouchers = state.deal_client().load_vouchers_for_deal(cid).await?;

    Ok((StatusCode::OK, Json(vouchers)))
}

#[derive(Debug, thiserror::Error)]
pub enum VouchersError {
    #[error("{0}")]
    InvalidCid(String),
    #[error(transparent)]
    Deal(#[from] DealError),
}

impl IntoResponse for VouchersError {
    fn into_response(self) -> Response {
        match self {
            VouchersError::InvalidCid(message) => error_response(StatusCode::BAD_REQUEST, message),
            VouchersError::Deal(e) => error_response(deal_error_status(&e), e.to_string()),
        }
    }
}
