use alloy::primitives::Address;
use iroh_blobs::Hash;
use jax_deals::Response;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;

use super::ApiRequest;

#[derive(Debug, Clone, Serialize)]
pub struct Propose {
    pub miner: Address,
    pub data: Hash,
    pub ask_id: u64,
    pub duration: u64,
    pub allow_duplicates: bool,
}

impl ApiRequest for Propose {
    type Response = Response;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        let url = base_url.join("api/v0/deals")?;
        Ok(client.post(url).json(&self))
    }
}
