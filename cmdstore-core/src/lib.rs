//! Core of the cmdstore project: schema-configurable, append-only command collections
//! with paginated, streamed queries.
//!
//! This crate provides:
//!
//! - **Schemas** ([`schema`]) - Declarative index fields, validation hooks and the registry
//! - **Normalization** ([`normalize`]) - Turning appended JSON into indexed records
//! - **Query compilation** ([`compile`]) - Filter maps and time bounds to storage predicates
//! - **Pagination and links** ([`page`], [`links`]) - Query windows and HATEOAS navigation
//! - **Responses** ([`response`]) - The status/content-type/body triple and lazy JSON framing
//! - **Command store** ([`store`]) - The `register`/`append`/`query` entry points
//! - **Store backend abstraction** ([`backend`], [`collection`], [`query`]) - What storage
//!   engines implement
//! - **Configuration and errors** ([`config`], [`error`])
//!
//! # Example
//!
//! ```ignore
//! use cmdstore::{prelude::*, memory::InMemoryStore};
//!
//! let mut store = CommandStore::new(InMemoryStore::new());
//! store
//!     .register(
//!         CollectionSchema::builder("/audit")
//!             .field("actor", FieldRule::new().required().with_type(FieldType::String))
//!             .build(),
//!     )
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as cmdstore_core;

pub mod backend;
pub mod collection;
pub mod compile;
pub mod config;
pub mod error;
pub mod links;
pub mod normalize;
pub mod options;
pub mod page;
pub mod query;
pub mod record;
pub mod response;
pub mod schema;
pub mod store;
