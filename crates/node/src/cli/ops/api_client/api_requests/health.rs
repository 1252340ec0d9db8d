use alloy::primitives::Address;
use iroh::NodeId;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;

use super::ApiRequest;

pub struct Liveness;
pub struct Readiness;

#[derive(Debug, Deserialize)]
pub struct LivenessResponse {
    status: String,
}

impl LivenessResponse {
    pub fn status(&self) -> &str {
        &self.status
    }
}

#[derive(Debug, Deserialize)]
pub struct ReadinessResponse {
    pub node_id: NodeId,
    pub wallet_address: Option<Address>,
    pub deals: usize,
}

impl ApiRequest for Liveness {
    type Response = LivenessResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.get(base_url.join("/_status/livez")?))
    }
}

impl ApiRequest for Readiness {
    type Response = ReadinessResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.get(base_url.join("/_status/readyz")?))
    }
}
