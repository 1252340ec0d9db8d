mod deals;
mod health;
mod propose;
mod query;
mod vouchers;

pub use deals::{DealSummary, Deals, DealsResponse};
pub use health::{Liveness, Readiness};
pub use propose::Propose;
pub use query::Query;
pub use vouchers::Vouchers;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Defintion of an API request
pub trait ApiRequest: Send + Sync {
    /// Has a response type
    type Response: DeserializeOwned;

    /// Builds a Reqwest request
    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError>;
}
