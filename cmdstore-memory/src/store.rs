//! In-memory storage implementation for command collections.
//!
//! Each collection is an append-only `Vec` of BSON documents behind its own async-aware
//! read-write lock, so records keep insertion order and a long-running stream over one
//! collection never blocks appends to another.

use async_trait::async_trait;
use bson::Document;
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};

use cmdstore_core::{
    backend::{RecordStream, StoreBackend, StoreBackendBuilder},
    error::CommandStoreResult,
    query::{Expr, StoreQuery},
};

use crate::evaluator::RecordEvaluator;

type CollectionLog = Arc<RwLock<Vec<Document>>>;
type StoreMap = HashMap<String, CollectionLog>;

/// Thread-safe in-memory storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state; clones share
/// the same collections.
///
/// # Performance
///
/// Every count and stream scans the collection (indexes are a no-op). Streams take the
/// collection's read lock once per pulled record, not for their whole lifetime.
///
/// # Example
///
/// ```ignore
/// use cmdstore_memory::InMemoryStore;
/// use cmdstore::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.insert_record("/logs", doc! { "level": "warn" }).await?;
///
/// assert_eq!(store.count_records("/logs", None).await?, 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> records in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    async fn log(&self, collection: &str) -> Option<CollectionLog> {
        self.store.read().await.get(collection).cloned()
    }
}

/// Position of a stream within a collection log.
struct ScanState {
    log: CollectionLog,
    filter: Option<Expr>,
    next_index: usize,
    to_skip: usize,
    remaining: Option<usize>,
}

impl ScanState {
    /// Finds the next record to emit, holding the read lock only for this pull.
    async fn pull(&mut self) -> Option<CommandStoreResult<Document>> {
        if self.remaining == Some(0) {
            return None;
        }

        let records = self.log.read().await;

        while let Some(document) = records.get(self.next_index) {
            self.next_index += 1;

            match RecordEvaluator::matches(document, self.filter.as_ref()) {
                Ok(false) => continue,
                Ok(true) if self.to_skip > 0 => self.to_skip -= 1,
                Ok(true) => {
                    if let Some(remaining) = self.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    return Some(Ok(document.clone()));
                }
                Err(err) => return Some(Err(err)),
            }
        }

        None
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn create_collection(&self, name: &str) -> CommandStoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn insert_record(&self, collection: &str, record: Document) -> CommandStoreResult<()> {
        let log = match self.log(collection).await {
            Some(log) => log,
            None => self
                .store
                .write()
                .await
                .entry(collection.to_string())
                .or_default()
                .clone(),
        };

        log.write().await.push(record);

        Ok(())
    }

    async fn count_records(
        &self,
        collection: &str,
        filter: Option<&Expr>,
    ) -> CommandStoreResult<u64> {
        let Some(log) = self.log(collection).await else {
            return Ok(0);
        };

        let mut count = 0;
        for document in log.read().await.iter() {
            if RecordEvaluator::matches(document, filter)? {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn stream_records(
        &self,
        collection: &str,
        query: StoreQuery,
    ) -> CommandStoreResult<RecordStream> {
        let Some(log) = self.log(collection).await else {
            return Ok(stream::empty().boxed());
        };

        let state = ScanState {
            log,
            filter: query.filter,
            next_index: 0,
            to_skip: query.skip.unwrap_or(0),
            remaining: query.limit,
        };

        Ok(stream::unfold(state, |mut state| async move {
            state.pull().await.map(|item| (item, state))
        })
        .boxed())
    }

    async fn create_index(&self, _collection: &str, _field: &str) -> CommandStoreResult<()> {
        // In-memory store does not support indexing (no-op)
        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> CommandStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};

    async fn seeded(count: i64) -> InMemoryStore {
        let store = InMemoryStore::new();
        for n in 0..count {
            let parity = if n % 2 == 0 { "even" } else { "odd" };
            store
                .insert_record("/numbers", doc! { "n": n, "parity": parity })
                .await
                .unwrap();
        }
        store
    }

    async fn collect(store: &InMemoryStore, query: StoreQuery) -> Vec<i64> {
        store
            .stream_records("/numbers", query)
            .await
            .unwrap()
            .map(|doc| doc.unwrap().get_i64("n").unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn keeps_insertion_order() {
        let store = seeded(5).await;

        assert_eq!(collect(&store, StoreQuery::new()).await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn skip_and_limit_apply_to_matches() {
        let store = seeded(10).await;
        let query = StoreQuery::builder()
            .filter(Expr::eq("parity", "even"))
            .skip(1)
            .limit(3)
            .build();

        assert_eq!(collect(&store, query).await, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn counts_matches() {
        let store = seeded(7).await;

        assert_eq!(store.count_records("/numbers", None).await.unwrap(), 7);
        assert_eq!(
            store
                .count_records("/numbers", Some(&Expr::eq("parity", "odd")))
                .await
                .unwrap(),
            3
        );
        assert_eq!(store.count_records("/missing", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_collection_streams_nothing() {
        let store = InMemoryStore::new();
        let records = store
            .stream_records("/missing", StoreQuery::new())
            .await
            .unwrap()
            .collect::<Vec<_>>()
            .await;

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn open_stream_does_not_block_appends() {
        let store = seeded(3).await;
        let mut records = store.stream_records("/numbers", StoreQuery::new()).await.unwrap();

        assert!(records.next().await.is_some());
        store
            .insert_record("/numbers", doc! { "n": Bson::Int64(3), "parity": "odd" })
            .await
            .unwrap();

        assert_eq!(records.count().await, 3);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryStore::new();
        let clone = store.clone();

        clone.create_collection("/a").await.unwrap();
        clone.insert_record("/a", doc! { "x": 1 }).await.unwrap();

        assert_eq!(store.count_records("/a", None).await.unwrap(), 1);
    }
}
