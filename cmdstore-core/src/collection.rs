//! Collection and cursor handles over a storage backend.
//!
//! These are the storage operations the command store consumes: a [`Collection`]
//! appends records and opens [`Cursor`]s; a cursor counts its matches and streams a
//! skip/limit window of them through a transform.
//!
//! # Example
//!
//! ```ignore
//! let collection = store.collection("/logs");
//! let cursor = collection.find(Expr::eq("level", "warn"));
//!
//! let total = cursor.count().await?;
//! let mut records = cursor.skip(10).limit(10).stream(Record::from_document).await?;
//!
//! while let Some(record) = records.next().await {
//!     println!("{:?}", record?);
//! }
//! ```

use bson::Document;
use futures::{StreamExt, stream::BoxStream};

use crate::{
    backend::StoreBackend,
    error::CommandStoreResult,
    query::{Expr, StoreQuery},
    record::Record,
};

/// A named collection on a backend.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: impl Into<String>, backend: &'a B) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    /// Creates the backing collection if needed.
    pub async fn create(&self) -> CommandStoreResult<()> {
        self.backend.create_collection(&self.name).await
    }

    /// Appends one normalized record.
    pub async fn insert_one(&self, record: &Record) -> CommandStoreResult<()> {
        self.backend
            .insert_record(&self.name, record.to_document()?)
            .await
    }

    /// Creates an index on a top-level field.
    pub async fn create_index(&self, field: &str) -> CommandStoreResult<()> {
        self.backend.create_index(&self.name, field).await
    }

    /// Opens a cursor over the records matching `filter`.
    pub fn find(&self, filter: Expr) -> Cursor<'a, B> {
        Cursor {
            collection: self.name.clone(),
            backend: self.backend,
            query: StoreQuery::builder().filter(filter).build(),
        }
    }
}

/// A lazily evaluated query over one collection.
///
/// Nothing touches the backend until [`Cursor::count`] or [`Cursor::stream`] is awaited.
#[derive(Debug)]
pub struct Cursor<'a, B: StoreBackend> {
    collection: String,
    backend: &'a B,
    query: StoreQuery,
}

impl<'a, B: StoreBackend> Cursor<'a, B> {
    /// Counts every record matching the cursor's filter, ignoring skip and limit.
    pub async fn count(&self) -> CommandStoreResult<u64> {
        self.backend
            .count_records(&self.collection, self.query.filter.as_ref())
            .await
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.query.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Opens the record stream, mapping each stored document through `transform` as it
    /// is pulled.
    pub async fn stream<T, F>(
        self,
        mut transform: F,
    ) -> CommandStoreResult<BoxStream<'static, CommandStoreResult<T>>>
    where
        T: Send + 'static,
        F: FnMut(Document) -> CommandStoreResult<T> + Send + 'static,
    {
        Ok(self
            .backend
            .stream_records(&self.collection, self.query)
            .await?
            .map(move |document| document.and_then(&mut transform))
            .boxed())
    }
}
