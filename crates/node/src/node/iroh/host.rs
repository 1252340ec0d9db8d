use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use iroh::endpoint::{Connection, ConnectionError};
use iroh::{Endpoint, NodeAddr, NodeId};
use iroh_blobs::Hash;
use jax_deals::{codec, ClientNode, ExchangeError};

use super::blobs_service::BlobsService;

/// QUIC crypto error carrying TLS alert 120 (no_application_protocol)
const NO_APPLICATION_PROTOCOL: u64 = 0x100 + 120;

/// The node's iroh endpoint and blob store, as seen by the deal client
#[derive(Clone, Debug)]
pub struct IrohClientNode {
    endpoint: Endpoint,
    blobs_service: BlobsService,
    exchange_timeout: Duration,
}

impl IrohClientNode {
    pub fn new(endpoint: Endpoint, blobs_service: BlobsService, exchange_timeout: Duration) -> Self {
        Self {
            endpoint,
            blobs_service,
            exchange_timeout,
        }
    }

    async fn exchange(
        &self,
        alpn: &'static [u8],
        peer: NodeId,
        request: Bytes,
    ) -> Result<Bytes, ExchangeError> {
        let connection = connect(&self.endpoint, peer, alpn).await?;

        let (mut send, mut recv) = connection
            .open_bi()
            .await
            .map_err(|e| ExchangeError::Connect(e.into()))?;

        codec::write_frame(&mut send, request).await?;
        send.finish().map_err(|e| ExchangeError::Write(e.into()))?;
        let response = codec::read_frame(&mut recv).await?;

        connection.close(0u32.into(), b"done");
        Ok(response)
    }
}

#[async_trait]
impl ClientNode for IrohClientNode {
    async fn get_file_size(&self, data: &Hash) -> Result<u64> {
        self.blobs_service.blob_size(*data).await
    }

    async fn make_protocol_request(
        &self,
        alpn: &'static [u8],
        peer: NodeId,
        request: Bytes,
    ) -> Result<Bytes, ExchangeError> {
        match tokio::time::timeout(self.exchange_timeout, self.exchange(alpn, peer, request)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    tracing::debug!(%peer, error = %e, "exchange failed");
                }
                result
            }
            Err(_) => {
                tracing::warn!(%peer, timeout = ?self.exchange_timeout, "exchange timed out");
                Err(ExchangeError::TimedOut(self.exchange_timeout))
            }
        }
    }
}

/// Dial `peer` on `alpn`, telling a peer that lacks the protocol apart from
/// one that cannot be reached
async fn connect(
    endpoint: &Endpoint,
    peer: impl Into<NodeAddr>,
    alpn: &[u8],
) -> Result<Connection, ExchangeError> {
    endpoint.connect(peer, alpn).await.map_err(|e| {
        if is_alpn_rejection(&e) {
            ExchangeError::ProtocolUnsupported
        } else {
            ExchangeError::Connect(e)
        }
    })
}

/// Whether the peer refused the connection because it does not speak the
/// requested protocol
fn is_alpn_rejection(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| match cause.downcast_ref::<ConnectionError>() {
            Some(ConnectionError::ConnectionClosed(close)) => {
                u64::from(close.error_code) == NO_APPLICATION_PROTOCOL
            }
            Some(ConnectionError::TransportError(e)) => u64::from(e.code) == NO_APPLICATION_PROTOCOL,
            _ => false,
        })
}
