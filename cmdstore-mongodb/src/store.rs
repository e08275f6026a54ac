//! MongoDB storage implementation for command collections.

use async_trait::async_trait;
use bson::{Document, doc};
use futures::StreamExt;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    options::{ClientOptions, FindOptions},
};
use tracing::{debug, info};

use cmdstore_core::{
    backend::{RecordStream, StoreBackend, StoreBackendBuilder},
    error::{CommandStoreError, CommandStoreResult},
    query::{Expr, StoreQuery},
};

use crate::{query::MongoQueryTranslator, sanitizer::KeySanitizer};

const COLLECTION_PREFIX: &str = "cmd";

fn storage_error(err: mongodb::error::Error) -> CommandStoreError {
    CommandStoreError::Storage(err.to_string())
}

/// MongoDB-backed storage.
///
/// Collection paths map one-to-one onto MongoDB collection names: `%`, `.` and `$` are
/// percent-escaped, separators become dots and the result is prefixed with `cmd`
/// (`/audit/logins` -> `cmd.audit.logins`).
/// Records are read back in natural order, which for these append-only collections is
/// insertion order.
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    pub(crate) fn collection_name(path: &str) -> String {
        format!(
            "{COLLECTION_PREFIX}{}",
            KeySanitizer::escape_key(path).replace('/', ".")
        )
    }

    fn get_collection(&self, path: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&Self::collection_name(path))
    }

    /// Strips the driver-assigned `_id` and restores escaped keys.
    fn restore_document(mut document: Document) -> Document {
        document.remove("_id");
        KeySanitizer::restore_document(document)
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn create_collection(&self, name: &str) -> CommandStoreResult<()> {
        let database = self.client.database(&self.database);
        let collection = Self::collection_name(name);

        let existing = database
            .list_collection_names()
            .filter(doc! { "name": collection.as_str() })
            .await
            .map_err(storage_error)?;

        if existing.is_empty() {
            database
                .create_collection(&collection)
                .await
                .map_err(storage_error)?;
            debug!(collection = %collection, "created collection");
        }

        Ok(())
    }

    async fn insert_record(&self, collection: &str, record: Document) -> CommandStoreResult<()> {
        self.get_collection(collection)
            .insert_one(KeySanitizer::escape_document(record))
            .await
            .map_err(storage_error)?;

        Ok(())
    }

    async fn count_records(
        &self,
        collection: &str,
        filter: Option<&Expr>,
    ) -> CommandStoreResult<u64> {
        self.get_collection(collection)
            .count_documents(MongoQueryTranslator::translate(filter)?)
            .await
            .map_err(storage_error)
    }

    async fn stream_records(
        &self,
        collection: &str,
        query: StoreQuery,
    ) -> CommandStoreResult<RecordStream> {
        let mut options = FindOptions::default();

        options.sort = Some(doc! { "$natural": 1 });
        if let Some(skip) = query.skip {
            options.skip = Some(skip as u64);
        }
        if let Some(limit) = query.limit {
            options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        // Dropping the cursor makes the driver kill it server-side.
        let cursor = self
            .get_collection(collection)
            .find(MongoQueryTranslator::translate(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(storage_error)?;

        Ok(cursor
            .map(|document| document.map(Self::restore_document).map_err(storage_error))
            .boxed())
    }

    async fn create_index(&self, collection: &str, field: &str) -> CommandStoreResult<()> {
        let key = KeySanitizer::escape_key(field);

        self.get_collection(collection)
            .create_index(IndexModel::builder().keys(doc! { key: 1 }).build())
            .await
            .map_err(storage_error)?;

        Ok(())
    }

    async fn shutdown(self) -> CommandStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Builder for [`MongoDbStore`], connecting from a connection string.
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> CommandStoreResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| CommandStoreError::Initialization(e.to_string()))?;
        let client = Client::with_options(options)
            .map_err(|e| CommandStoreError::Initialization(e.to_string()))?;

        info!(database = %self.database, "connected to MongoDB");

        Ok(MongoDbStore::new(client, self.database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_paths_to_collection_names() {
        assert_eq!(MongoDbStore::collection_name("/logs"), "cmd.logs");
        assert_eq!(MongoDbStore::collection_name("/audit/logins"), "cmd.audit.logins");
        assert_eq!(MongoDbStore::collection_name("/a$b"), "cmd.a%24b");
    }

    #[test]
    fn distinct_paths_get_distinct_collections() {
        let paths = ["/a.b", "/a/b", "/a$b", "/a_b", "/a", "/a/", "a", "/", ""];
        let names = paths
            .iter()
            .map(|path| MongoDbStore::collection_name(path))
            .collect::<std::collections::HashSet<_>>();

        assert_eq!(names.len(), paths.len());
    }
}
