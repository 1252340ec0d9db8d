use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client, Url,
};
use std::fmt::Debug;

use super::api_requests::ApiRequest;
use super::error::ApiError;

#[derive(Debug, Clone)]
/// Client for a running node's HTTP API
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    /// Send `request` and decode its JSON response
    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            let status = response.status();
            Err(ApiError::from_status(status, response.text().await?))
        }
    }
}
