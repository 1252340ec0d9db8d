use alloy::primitives::{Address, U256};
use iroh_blobs::Hash;
use jax_deals::DealState;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;

use super::ApiRequest;

#[derive(Debug, Clone)]
pub struct Deals;

#[derive(Debug, Deserialize)]
pub struct DealSummary {
    pub proposal_cid: Hash,
    pub miner: Address,
    pub piece_ref: Hash,
    pub size: u64,
    pub duration: u64,
    pub total_price: U256,
    pub channel: U256,
    pub state: DealState,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DealsResponse {
    pub deals: Vec<DealSummary>,
}

impl ApiRequest for Deals {
    type Response = DealsResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.get(base_url.join("api/v0/deals")?))
    }
}
