use iroh_blobs::Hash;
use jax_deals::PaymentVoucher;
use reqwest::{Client, RequestBuilder, Url};

use super::ApiRequest;

#[derive(Debug, Clone)]
pub struct Vouchers {
    pub cid: Hash,
}

impl ApiRequest for Vouchers {
    type Response = Vec<PaymentVoucher>;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        let url = base_url.join(&format!("api/v0/deals/{}/vouchers", self.cid))?;
        Ok(client.get(url))
    }
}
