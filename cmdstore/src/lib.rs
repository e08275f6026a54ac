//! Main cmdstore crate: schema-configurable, append-only command collections with
//! paginated, streamed queries.
//!
//! This crate is the primary entry point. It re-exports the core types from
//! `cmdstore-core` and provides access to the storage backends.
//!
//! # Features
//!
//! - **Declarative schemas** - Typed, validated index fields per collection path
//! - **Append-only records** - Every stored record passed its schema at write time
//! - **Filtered, windowed queries** - Index filters, time bounds, position/limit paging
//! - **Streaming responses** - JSON envelopes with navigation links, emitted lazily
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use cmdstore::{prelude::*, memory::InMemoryStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut store = CommandStore::new(InMemoryStore::builder().build().await.unwrap());
//!
//!     // Register collections during startup
//!     store
//!         .register(
//!             CollectionSchema::builder("/logs")
//!                 .field(
//!                     "type",
//!                     FieldRule::new()
//!                         .required()
//!                         .with_type(FieldType::String)
//!                         .with_validator(|v| {
//!                             matches!(v.as_str(), Some("info" | "warn" | "error"))
//!                         }),
//!                 )
//!                 .build(),
//!         )
//!         .await
//!         .unwrap();
//!
//!     // Append a record
//!     let response = store.append("/logs", json!({ "type": "warn", "msg": "disk at 91%" })).await;
//!     assert_eq!(response.status_code, 200);
//!
//!     // Query the most recent warnings
//!     let params = QueryParams::from_pairs(vec![("type", "warn"), ("~limit", "20")], '~');
//!     let body = store.query("/logs", &params).await.into_text().await;
//!
//!     println!("{body}");
//!
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Serving requests
//!
//! The store is transport-agnostic. After registration, share it behind an `Arc` and
//! hand each request's path, JSON body or decoded query-string pairs to
//! [`CommandStore::append`](store::CommandStore::append) or
//! [`CommandStore::query`](store::CommandStore::query). Both always resolve to a
//! [`Response`](response::Response) whose body is either empty, a JSON error object, or a
//! stream of text chunks to forward as they are produced.
//!
//! # Backends
//!
//! - [`memory`] - In-process storage for development, tests and ephemeral logs
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use cmdstore_core::{
    backend, collection, compile, config, error, links, normalize, options, page, query, record,
    response, schema, store,
};

// Re-export BSON and JSON types for convenience
pub use bson;
pub use serde_json;

/// In-memory storage backend implementations.
pub mod memory {
    pub use cmdstore_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use cmdstore_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
