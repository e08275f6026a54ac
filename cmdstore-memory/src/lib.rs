//! In-memory storage backend for cmdstore.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development,
//! testing, and single-process deployments that do not need durability.
//!
//! # Features
//!
//! - **Insertion order** - Collections are append-only logs, streamed oldest first
//! - **Full predicate support** - Evaluates compiled filters and time bounds in process
//! - **Pull-based streams** - Records are copied out one at a time as the consumer polls
//!
//! # Quick Start
//!
//! ```ignore
//! use cmdstore::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let mut store = CommandStore::new(backend);
//!
//!     store
//!         .register(CollectionSchema::builder("/logs").build())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as cmdstore_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
