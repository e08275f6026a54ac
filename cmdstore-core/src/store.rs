//! The command store: schema registration, appends and paginated queries.
//!
//! A [`CommandStore`] is built in two phases. During startup it is owned mutably and
//! every collection schema is [registered](CommandStore::register). After that it is
//! only used through `&self` (typically behind an `Arc`) to serve
//! [`append`](CommandStore::append) and [`query`](CommandStore::query) requests, which
//! never fail: every outcome, including storage errors, becomes a [`Response`].
//!
//! # Example
//!
//! ```ignore
//! use cmdstore::{prelude::*, memory::InMemoryStore};
//! use serde_json::json;
//!
//! let mut store = CommandStore::new(InMemoryStore::new());
//! store
//!     .register(
//!         CollectionSchema::builder("/logs")
//!             .field("level", FieldRule::new().required().with_type(FieldType::String))
//!             .build(),
//!     )
//!     .await?;
//!
//! let response = store.append("/logs", json!({ "level": "warn", "msg": "disk at 91%" })).await;
//! assert_eq!(response.status_code, 200);
//!
//! let page = store
//!     .query("/logs", &QueryParams::new().with_filter("level", "warn"))
//!     .await
//!     .into_text()
//!     .await;
//! ```

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    backend::StoreBackend,
    collection::Collection,
    compile::compile,
    config::StoreConfig,
    error::{CommandStoreError, CommandStoreResult},
    links::{build_links, collection_url},
    normalize::normalize,
    options::QueryParams,
    page::QueryWindow,
    record::{Record, TIMESTAMP_FIELD},
    response::{Response, envelope, envelope_header},
    schema::{CollectionSchema, SchemaRegistry},
};

/// Schema-validated, append-only command collections over a storage backend.
#[derive(Debug)]
pub struct CommandStore<B: StoreBackend> {
    backend: B,
    registry: SchemaRegistry,
    config: StoreConfig,
}

impl<B: StoreBackend> CommandStore<B> {
    /// Creates a store with the default configuration.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            registry: SchemaRegistry::new(),
            config: StoreConfig::default(),
        }
    }

    /// Creates a store with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CommandStoreError::Config`] if the configuration is invalid.
    pub fn with_config(backend: B, config: StoreConfig) -> CommandStoreResult<Self> {
        config.validate()?;

        Ok(Self {
            backend,
            registry: SchemaRegistry::new(),
            config,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Registered collection paths, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.registry.paths()
    }

    pub fn schema(&self, path: &str) -> Option<&Arc<CollectionSchema>> {
        self.registry.lookup(path).ok()
    }

    /// Gets a handle on the backing collection of a path, registered or not.
    pub fn collection(&self, path: &str) -> Collection<'_, B> {
        Collection::new(path, &self.backend)
    }

    /// Registers a collection schema and prepares its backing collection.
    ///
    /// Collection and index creation are best-effort: failures are logged and the
    /// schema stays registered, queries just lose the index.
    ///
    /// # Errors
    ///
    /// Returns [`CommandStoreError::Config`] if the schema is invalid or its path is
    /// already registered.
    pub async fn register(&mut self, schema: CollectionSchema) -> CommandStoreResult<()> {
        let schema = self.registry.register(schema)?;
        let collection = self.collection(schema.path());

        info!(
            path = %schema.path(),
            fields = schema.fields().count(),
            "registered command collection"
        );

        if let Err(err) = collection.create().await {
            warn!(path = %schema.path(), error = %err, "failed to create collection");
        }

        let fields = schema
            .fields()
            .map(|(name, _)| name)
            .chain(std::iter::once(TIMESTAMP_FIELD));

        for field in fields {
            if let Err(err) = collection.create_index(field).await {
                warn!(path = %schema.path(), field, error = %err, "failed to create index");
            }
        }

        Ok(())
    }

    /// Validates and appends one record.
    ///
    /// Resolves to 200 with an empty body on success, 404 for an unregistered path
    /// (storage is not touched), and 500 otherwise; validation failures name the
    /// offending property in the body.
    pub async fn append(&self, path: &str, body: Value) -> Response {
        match self.try_append(path, body).await {
            Ok(()) => Response::empty(),
            Err(err) => self.error_response(path, "append", err),
        }
    }

    async fn try_append(&self, path: &str, body: Value) -> CommandStoreResult<()> {
        let schema = self.registry.lookup(path)?;
        let record = normalize(schema, body)?;

        self.collection(path).insert_one(&record).await?;
        debug!(path, "appended record");

        Ok(())
    }

    /// Runs a paginated query and streams the page as a JSON envelope.
    ///
    /// The total count is read before the page is streamed; concurrent appends in
    /// between can make the two disagree.
    pub async fn query(&self, path: &str, params: &QueryParams) -> Response {
        match self.try_query(path, params).await {
            Ok(response) => response,
            Err(err) => self.error_response(path, "query", err),
        }
    }

    async fn try_query(&self, path: &str, params: &QueryParams) -> CommandStoreResult<Response> {
        let schema = self.registry.lookup(path)?;
        let options = params.query_options();
        let cursor = self
            .collection(path)
            .find(compile(schema, &params.filter, &options));

        let total_count = cursor.count().await?;
        let window = QueryWindow::paginate(total_count, &options, &self.config);
        let links = build_links(
            &window,
            &collection_url(&self.config.base_url, path),
            params,
            self.config.option_marker,
        );
        let header = envelope_header(&links, &window.metadata())?;

        debug!(
            path,
            position = window.position,
            limit = window.limit,
            total_count,
            in_bounds = window.in_bounds(),
            "query window"
        );

        let values = match window.skip() {
            Some(skip) => {
                let timestamp_property = options.timestamp_property;
                let values = cursor
                    .skip(skip)
                    .limit(window.limit)
                    .stream(move |document| {
                        let record = Record::from_document(document)?;
                        Ok(record.into_output(timestamp_property.as_deref()))
                    })
                    .await?;

                Some(values)
            }
            None => None,
        };

        Ok(Response::stream(envelope(path, header, values)))
    }

    /// Live subscriptions are not supported.
    pub async fn subscribe(&self, path: &str) -> Response {
        self.not_implemented(path)
    }

    /// Live subscriptions are not supported.
    pub async fn unsubscribe(&self, path: &str) -> Response {
        self.not_implemented(path)
    }

    fn not_implemented(&self, path: &str) -> Response {
        match self.registry.lookup(path) {
            Ok(_) => Response::json(501, serde_json::json!({ "error": "Not Implemented" })),
            Err(err) => Response::from_error(&err),
        }
    }

    /// Shuts down the store and its backend.
    pub async fn shutdown(self) -> CommandStoreResult<()> {
        self.backend.shutdown().await
    }

    fn error_response(&self, path: &str, operation: &str, err: CommandStoreError) -> Response {
        match &err {
            CommandStoreError::NotFound(_) => debug!(path, operation, "unknown collection"),
            CommandStoreError::Validation { field, reason } => {
                debug!(path, operation, field = %field, reason = %reason, "rejected record")
            }
            _ => error!(path, operation, error = ?err, "command store operation failed"),
        }

        Response::from_error(&err)
    }
}
