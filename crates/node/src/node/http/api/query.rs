use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jax_deals::DealError;

use super::error::{deal_error_status, error_response, parse_cid};
use crate::node::State as NodeState;

/// Ask the miner of a recorded deal where it stands
pub async fn handler(
    State(state): State<NodeState>,
    Path(cid): Path<String>,
) -> Result<impl IntoResponse, QueryError> {
    let cid = parse_cid(&cid).map_err(QueryError::InvalidCid)?;
    let cancel = state.request_token();
    let response = state.deal_client().query_deal(&cancel, cid).await?;

    Ok((StatusCode::OK, Json(response)))
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("{0}")]
    InvalidCid(String),
    #[error(transparent)]
    Deal(#[from] DealError),
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        match self {
            QueryError::InvalidCid(message) => error_response(StatusCode::BAD_REQUEST, message),
            QueryError::Deal(e) => error_response(deal_error_status(&e), e.to_string()),
        }
    }
}
