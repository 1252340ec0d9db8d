#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("status code: {0}: {1}")]
    HttpStatus(reqwest::StatusCode, String),
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Build a status error, preferring the node's `{"error": ..}` message
    /// over the raw body
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        ApiError::HttpStatus(status, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_error_messages_are_unwrapped() {
        let err = ApiError::from_status(
            reqwest::StatusCode::CONFLICT,
            r#"{"error":"proposal is a duplicate"}"#.to_string(),
        );
        assert_eq!(err.to_string(), "status code: 409 Conflict: proposal is a duplicate");

        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, "upstream".to_string());
        assert_eq!(err.to_string(), "status code: 502 Bad Gateway: upstream");
    }
}
