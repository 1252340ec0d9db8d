use iroh_blobs::Hash;
use jax_deals::Response;
use reqwest::{Client, RequestBuilder, Url};

use super::ApiRequest;

#[derive(Debug, Clone)]
pub struct Query {
    pub cid: Hash,
}

impl ApiRequest for Query {
    type Response = Response;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        let url = base_url.join(&format!("api/v0/deals/{}", self.cid))?;
        Ok(client.get(url))
    }
}
