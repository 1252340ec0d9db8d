//! Durable key/value namespace backing the deal store

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use jax_deals::{Datastore, Deal, CLIENT_DATASTORE_PREFIX};
use redb::{Database, ReadableTable, TableDefinition};
use tokio::task::spawn_blocking;

const DEALS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("deals");

#[derive(Clone)]
pub struct RedbDatastore {
    db: Arc<Database>,
}

impl RedbDatastore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // create the table up front so reads on a fresh database succeed
        let tx = db.begin_write()?;
        {
            tx.open_table(DEALS_TABLE)?;
        }
        tx.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let db = self.db.clone();
        let key = key.to_string();
        spawn_blocking(move || -> Result<Option<Vec<u8>>> {
            let tx = db.begin_read()?;
            let table = tx.open_table(DEALS_TABLE)?;
            let value = table.get(key.as_str())?.map(|value| value.value().to_vec());
            Ok(value)
        })
        .await?
    }

    /// Every entry whose key starts with `prefix`, in key order
    pub async fn query_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let db = self.db.clone();
        let prefix = prefix.to_string();
        spawn_blocking(move || -> Result<Vec<(String, Vec<u8>)>> {
            let tx = db.begin_read()?;
            let table = tx.open_table(DEALS_TABLE)?;

            let mut entries = Vec::new();
            for item in table.range(prefix.as_str()..)? {
                let (key, value) = item?;
                let key = key.value();
                if !key.starts_with(prefix.as_str()) {
                    break;
                }
                entries.push((key.to_string(), value.value().to_vec()));
            }
            Ok(entries)
        })
        .await?
    }

    /// Decode every client deal. Decode failures end the stream with an error.
    pub fn deals(&self) -> BoxStream<'static, Result<Deal>> {
        let datastore = self.clone();
        let prefix = format!("/{}/", CLIENT_DATASTORE_PREFIX);

        stream::once(async move { datastore.query_prefix(&prefix).await })
            .flat_map(|entries| match entries {
                Ok(entries) => stream::iter(entries.into_iter().map(|(key, value)| {
                    bincode::deserialize::<Deal>(&value)
                        .map_err(|e| anyhow::anyhow!("malformed deal at {}: {}", key, e))
                }))
                .boxed(),
                Err(e) => stream::once(async move { Err(e) }).boxed(),
            })
            .boxed()
    }
}

#[async_trait]
impl Datastore for RedbDatastore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let db = self.db.clone();
        let key = key.to_string();
        // write transactions serialize inside redb; commit fsyncs
        spawn_blocking(move || -> Result<()> {
            let tx = db.begin_write()?;
            {
                let mut table = tx.open_table(DEALS_TABLE)?;
                table.insert(key.as_str(), value.as_slice())?;
            }
            tx.commit()?;
            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};
    use futures::TryStreamExt;
    use iroh_blobs::Hash;
    use jax_deals::{build_proposal, client_deal_key, DealState, Response};

    use super::*;

    fn deal(seed: u64) -> Deal {
        let proposal = build_proposal(
            Address::repeat_byte(0x4d),
            Hash::new(seed.to_be_bytes()),
            seed + 1,
            U256::from(10),
            3,
        )
        .unwrap();
        let proposal_cid = proposal.cid().unwrap();
        Deal {
            miner: Address::repeat_byte(0x4d),
            proposal_cid,
            proposal,
            response: Response {
                state: DealState::Accepted,
                message: String::new(),
                proposal_cid,
            },
        }
    }

    async fn put_deal(datastore: &RedbDatastore, deal: &Deal) {
        datastore
            .put(
                &client_deal_key(&deal.proposal_cid),
                bincode::serialize(deal).unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let datastore = RedbDatastore::open(&dir.path().join("deals.redb")).unwrap();

        assert!(datastore.get("/client/nothing").await.unwrap().is_none());
        datastore.put("/client/a", vec![1, 2, 3]).await.unwrap();
        assert_eq!(datastore.get("/client/a").await.unwrap(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn prefix_scan_stays_in_its_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let datastore = RedbDatastore::open(&dir.path().join("deals.redb")).unwrap();

        datastore.put("/client/a", vec![1]).await.unwrap();
        datastore.put("/client/b", vec![2]).await.unwrap();
        datastore.put("/clientele/c", vec![3]).await.unwrap();
        datastore.put("/miner/d", vec![4]).await.unwrap();

        let keys: Vec<String> = datastore
            .query_prefix("/client/")
            .await
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["/client/a", "/client/b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_writers_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let datastore = RedbDatastore::open(&dir.path().join("deals.redb")).unwrap();

        let writers: Vec<_> = (0..16u8)
            .map(|i| {
                let datastore = datastore.clone();
                tokio::spawn(async move {
                    datastore
                        .put(&format!("/client/{:02}", i), vec![i])
                        .await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let entries = datastore.query_prefix("/client/").await.unwrap();
        assert_eq!(entries.len(), 16);
        assert_eq!(entries[0], ("/client/00".to_string(), vec![0]));
        assert_eq!(entries[15], ("/client/15".to_string(), vec![15]));
    }

    #[tokio::test]
    async fn deals_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deals.redb");

        let first = deal(1);
        let second = deal(2);
        {
            let datastore = RedbDatastore::open(&path).unwrap();
            put_deal(&datastore, &first).await;
            put_deal(&datastore, &second).await;
        }

        let datastore = RedbDatastore::open(&path).unwrap();
        let mut deals: Vec<Deal> = datastore.deals().try_collect().await.unwrap();
        deals.sort_by_key(|d| d.proposal.size);
        assert_eq!(deals, vec![first, second]);
    }

    #[tokio::test]
    async fn malformed_deal_ends_enumeration() {
        let dir = tempfile::tempdir().unwrap();
        let datastore = RedbDatastore::open(&dir.path().join("deals.redb")).unwrap();
        datastore.put("/client/garbage", vec![0xff]).await.unwrap();

        let result: Result<Vec<Deal>> = datastore.deals().try_collect().await;
        assert!(result.is_err());
    }
}
