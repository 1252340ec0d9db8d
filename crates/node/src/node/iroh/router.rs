use anyhow::Result;
use iroh::{protocol::Router, Endpoint};
use tokio::sync::watch::Receiver as WatchReceiver;

use super::blobs_service::BlobsService;

const BLOBS_SERVICE_ALPN: &[u8] = iroh_blobs::ALPN;

/// Accept inbound connections until shutdown.
///
/// Only the blobs protocol is served; miners pull proposed data through it.
/// Deal protocols are dialed outbound by [`super::IrohClientNode`].
pub async fn router(
    endpoint: Endpoint,
    blobs_service: BlobsService,
    mut shutdown_rx: WatchReceiver<()>,
) -> Result<()> {
    let inner_blobs = blobs_service.get_inner_blobs().clone();
    let router = Router::builder(endpoint)
        .accept(BLOBS_SERVICE_ALPN, inner_blobs)
        .spawn()
        .await?;

    tracing::info!("node::iroh::router: router started");

    let _ = shutdown_rx.changed().await;

    tracing::info!("node::iroh::router: shutting down router");
    router.shutdown().await?;

    tracing::info!("node::iroh::router: router shutdown complete");
    Ok(())
}
