//! MongoDB backend implementation for cmdstore.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! persisting command collections and leaving filtering, skipping and streaming to
//! MongoDB's query engine.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cmdstore = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Records live in MongoDB Atlas or a self-hosted MongoDB
//! - **Server-side filtering** - Compiled predicates become MongoDB filter documents
//! - **Streaming** - Query pages are read through a live cursor, one batch at a time
//! - **Indexing** - Every declared index field gets a MongoDB index at registration
//!
//! # Example
//!
//! ```ignore
//! use cmdstore::{backend::StoreBackendBuilder, mongodb::MongoDbStore, store::CommandStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoDbStore::builder("mongodb://localhost:27017", "commands")
//!         .build()
//!         .await?;
//!     let store = CommandStore::new(backend);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as cmdstore_mongodb;

pub mod query;
pub mod sanitizer;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
