use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use iroh::Endpoint;
use iroh_blobs::rpc::client::blobs::BlobStatus;
use iroh_blobs::{net_protocol::Blobs, store::fs::Store, Hash};

/// Local content store, also served to miners fetching deal data
#[derive(Clone, Debug)]
pub struct BlobsService {
    blobs: Arc<Blobs<Store>>,
}

impl BlobsService {
    pub async fn load(blobs_path: &Path, endpoint: Endpoint) -> Result<Self> {
        let store = Store::load(blobs_path).await?;
        let blobs = Blobs::builder(store).build(&endpoint);
        Ok(Self {
            blobs: Arc::new(blobs),
        })
    }

    /// Size of a blob held completely in the local store
    pub async fn blob_size(&self, hash: Hash) -> Result<u64> {
        match self.blobs.client().status(hash).await? {
            BlobStatus::Complete { size } => Ok(size),
            BlobStatus::Partial { .. } => Err(anyhow!("data is not fully available locally")),
            BlobStatus::NotFound => Err(anyhow!("blob not found: {}", hash)),
        }
    }

    pub fn get_inner_blobs(&self) -> &Arc<Blobs<Store>> {
        &self.blobs
    }
}
