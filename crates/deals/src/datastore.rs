use anyhow::Result;
use async_trait::async_trait;

/// Durable key/value namespace the deal store mirrors into
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Store `value` under `key`, replacing what was there.
    /// Must only return once the write is durable.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;
}
