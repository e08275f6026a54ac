//! Storage backend abstraction for the command store.
//!
//! The engine treats persistence as a capability it consumes: an append-only, insertion
//! ordered set of BSON documents per collection that can be counted and streamed under a
//! predicate. [`StoreBackend`] is that capability; `cmdstore-memory` and `cmdstore-mongodb`
//! implement it.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::CommandStoreResult,
    query::{Expr, StoreQuery},
};

/// A lazily pulled sequence of stored records.
///
/// Dropping the stream must release whatever cursor or lock backs it.
pub type RecordStream = BoxStream<'static, CommandStoreResult<Document>>;

/// Core trait for storage backend implementations.
///
/// Implementations must be thread-safe and keep each collection in insertion order:
/// [`StoreBackend::stream_records`] yields matching records oldest first, and `skip`
/// counts from the oldest matching record.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Creates a collection if it does not exist yet. Idempotent.
    async fn create_collection(&self, name: &str) -> CommandStoreResult<()>;

    /// Appends a single record to a collection.
    async fn insert_record(&self, collection: &str, record: Document) -> CommandStoreResult<()>;

    /// Counts the records matching `filter` (all records when `None`).
    async fn count_records(
        &self,
        collection: &str,
        filter: Option<&Expr>,
    ) -> CommandStoreResult<u64>;

    /// Opens a lazy stream over the records matching `query`, honoring its skip and limit.
    ///
    /// An unknown collection yields an empty stream.
    async fn stream_records(
        &self,
        collection: &str,
        query: StoreQuery,
    ) -> CommandStoreResult<RecordStream>;

    /// Creates an ascending index on a top-level field.
    ///
    /// Callers treat failures as non-fatal; backends without indexes return `Ok(())`.
    async fn create_index(&self, collection: &str, field: &str) -> CommandStoreResult<()>;

    /// Releases backend resources.
    async fn shutdown(self) -> CommandStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn create_collection(&self, name: &str) -> CommandStoreResult<()> {
        (*self).create_collection(name).await
    }

    async fn insert_record(&self, collection: &str, record: Document) -> CommandStoreResult<()> {
        (*self).insert_record(collection, record).await
    }

    async fn count_records(
        &self,
        collection: &str,
        filter: Option<&Expr>,
    ) -> CommandStoreResult<u64> {
        (*self).count_records(collection, filter).await
    }

    async fn stream_records(
        &self,
        collection: &str,
        query: StoreQuery,
    ) -> CommandStoreResult<RecordStream> {
        (*self).stream_records(collection, query).await
    }

    async fn create_index(&self, collection: &str, field: &str) -> CommandStoreResult<()> {
        (*self).create_index(collection, field).await
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend,
{
    async fn create_collection(&self, name: &str) -> CommandStoreResult<()> {
        (**self).create_collection(name).await
    }

    async fn insert_record(&self, collection: &str, record: Document) -> CommandStoreResult<()> {
        (**self).insert_record(collection, record).await
    }

    async fn count_records(
        &self,
        collection: &str,
        filter: Option<&Expr>,
    ) -> CommandStoreResult<u64> {
        (**self).count_records(collection, filter).await
    }

    async fn stream_records(
        &self,
        collection: &str,
        query: StoreQuery,
    ) -> CommandStoreResult<RecordStream> {
        (**self).stream_records(collection, query).await
    }

    async fn create_index(&self, collection: &str, field: &str) -> CommandStoreResult<()> {
        (**self).create_index(collection, field).await
    }
}

/// Factory trait for creating backend instances.
///
/// # Example
///
/// ```ignore
/// let backend = InMemoryStore::builder().build().await?;
/// ```
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    /// Builds and initializes the backend.
    async fn build(self) -> CommandStoreResult<Self::Backend>;
}
