//! Error types and result types for command store operations.
//!
//! Every fallible operation in the workspace returns a [`CommandStoreResult<T>`].
//! The public `append`/`query` operations of [`CommandStore`](crate::store::CommandStore)
//! never surface these directly; they turn them into a [`Response`](crate::response::Response)
//! through [`CommandStoreError::status_code`].

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when registering, appending to,
/// or querying a command collection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandStoreError {
    /// A schema registration or store configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(String),
    /// An appended record violated its collection schema.
    /// `field` is the first offending index field in registration order.
    #[error("Validation error on property {field}: {reason}")]
    Validation {
        /// The offending field name.
        field: String,
        /// Why the field was rejected.
        reason: String,
    },
    /// No collection is registered under the requested path.
    #[error("Collection not found: {0}")]
    NotFound(String),
    /// Serialization/deserialization error when converting between JSON and BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error occurred in the underlying storage backend.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CommandStoreError {
    /// Shorthand for a [`CommandStoreError::Validation`].
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CommandStoreError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The HTTP status code this error is surfaced as.
    ///
    /// Validation failures map to a 500 like every other non-lookup failure;
    /// only the response body differs (see [`CommandStoreError::is_client_visible`]).
    pub fn status_code(&self) -> u16 {
        match self {
            CommandStoreError::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Whether the error message may be shown to the client as-is.
    ///
    /// Storage and serialization details stay server-side.
    pub fn is_client_visible(&self) -> bool {
        matches!(
            self,
            CommandStoreError::Validation { .. } | CommandStoreError::NotFound(_)
        )
    }
}

/// A specialized `Result` type for command store operations.
pub type CommandStoreResult<T> = Result<T, CommandStoreError>;

impl From<BsonError> for CommandStoreError {
    fn from(err: BsonError) -> Self {
        CommandStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for CommandStoreError {
    fn from(err: SerdeJsonError) -> Self {
        CommandStoreError::Serialization(err.to_string())
    }
}
