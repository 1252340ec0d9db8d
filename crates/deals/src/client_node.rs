use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use iroh::NodeId;
use iroh_blobs::Hash;

use crate::error::ExchangeError;

/// Local content store and peer transport used by the deal client
#[async_trait]
pub trait ClientNode: Send + Sync {
    /// Size in bytes of the data referenced by `data`
    async fn get_file_size(&self, data: &Hash) -> Result<u64>;

    /// Open a stream to `peer` under `alpn`, write `request` as a single
    /// frame and wait for a single response frame.
    ///
    /// Implementations must not reuse a stream after a failed write or read.
    async fn make_protocol_request(
        &self,
        alpn: &'static [u8],
        peer: NodeId,
        request: Bytes,
    ) -> Result<Bytes, ExchangeError>;
}

#[async_trait]
impl<T: ClientNode + ?Sized> ClientNode for std::sync::Arc<T> {
    async fn get_file_size(&self, data: &Hash) -> Result<u64> {
        (**self).get_file_size(data).await
    }

    async fn make_protocol_request(
        &self,
        alpn: &'static [u8],
        peer: NodeId,
        request: Bytes,
    ) -> Result<Bytes, ExchangeError> {
        (**self).make_protocol_request(alpn, peer, request).await
    }
}
