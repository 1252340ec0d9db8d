use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use iroh_blobs::Hash;
use jax_deals::{DealError, ExchangeError};

/// Status a deal failure is reported with
pub fn deal_error_status(err: &DealError) -> StatusCode {
    match err {
        DealError::Duplicate | DealError::AlreadyInProgress(_) => StatusCode::CONFLICT,
        DealError::NoSuchProposal(_) => StatusCode::NOT_FOUND,
        DealError::WalletNotConfigured => StatusCode::PRECONDITION_FAILED,
        DealError::Rejected(_)
        | DealError::Failed(_)
        | DealError::InvalidResponse(_)
        | DealError::Decode(_) => StatusCode::BAD_GATEWAY,
        DealError::SendProposal(e) | DealError::QueryDeal(e) => match e {
            ExchangeError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            ExchangeError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        },
        DealError::FileSize(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(status: StatusCode, message: String) -> Response {
    let body = Json(serde_json::json!({
        "error": message,
    }));

    (status, body).into_response()
}

/// Parse a proposal cid taken from the request path
pub fn parse_cid(cid: &str) -> Result<Hash, String> {
    Hash::from_str(cid).map_err(|e| format!("invalid proposal cid {:?}: {}", cid, e))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jax_deals::DealState;

    use super::*;

    #[test]
    fn statuses_follow_the_failure() {
        let cid = Hash::new(b"proposal");
        assert_eq!(deal_error_status(&DealError::Duplicate), StatusCode::CONFLICT);
        assert_eq!(
            deal_error_status(&DealError::AlreadyInProgress(cid)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            deal_error_status(&DealError::NoSuchProposal(cid)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            deal_error_status(&DealError::WalletNotConfigured),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            deal_error_status(&DealError::Rejected("no".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            deal_error_status(&DealError::InvalidResponse(DealState::Started)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            deal_error_status(&DealError::SendProposal(ExchangeError::ProtocolUnsupported)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            deal_error_status(&DealError::QueryDeal(ExchangeError::TimedOut(
                Duration::from_secs(1)
            ))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            deal_error_status(&DealError::Persist(anyhow::anyhow!("disk full"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn path_cids_round_trip() {
        let cid = Hash::new(b"proposal");
        assert_eq!(parse_cid(&cid.to_string()).unwrap(), cid);
        assert!(parse_cid("not-a-cid").is_err());
    }
}
