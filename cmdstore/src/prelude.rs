//! Convenient re-exports of commonly used types from cmdstore.
//!
//! ```ignore
//! use cmdstore::prelude::*;
//! ```

pub use cmdstore_core::{
    backend::{RecordStream, StoreBackend, StoreBackendBuilder},
    config::{StoreConfig, StoreConfigBuilder},
    error::{CommandStoreError, CommandStoreResult},
    options::{QueryOptions, QueryParams},
    page::QueryWindow,
    query::{Expr, FieldOp, StoreQuery},
    record::Record,
    response::{Response, ResponseBody},
    schema::{CollectionSchema, FieldRule, FieldType, SchemaRegistry},
    store::CommandStore,
};
