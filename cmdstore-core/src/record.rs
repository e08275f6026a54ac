//! The persisted unit of a command collection.
//!
//! A [`Record`] is what the normalizer produces and what backends store: the indexed
//! fields extracted from an appended payload, the server-assigned `_timestamp`, and the
//! payload itself under `_payload`. Index fields live at the top level of the stored
//! document so backends can filter and index them directly.

use bson::{Bson, DateTime, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use chrono::SecondsFormat;
use serde_json::Value;

use crate::error::{CommandStoreError, CommandStoreResult};

/// Reserved field holding the server-assigned creation time.
pub const TIMESTAMP_FIELD: &str = "_timestamp";
/// Reserved field holding the original (possibly transformed) input object.
pub const PAYLOAD_FIELD: &str = "_payload";

/// A normalized, schema-valid command record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Indexed fields in registration order.
    pub fields: Document,
    /// Server-assigned creation time (millisecond precision).
    pub timestamp: DateTime,
    /// The stored payload, opaque to indexing.
    pub payload: Value,
}

impl Record {
    /// Converts this record to the BSON document handed to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CommandStoreError::Serialization`] if the payload cannot be represented
    /// as BSON (e.g. an unsigned integer above `i64::MAX`).
    pub fn to_document(&self) -> CommandStoreResult<Document> {
        let mut document = self.fields.clone();

        document.insert(TIMESTAMP_FIELD, Bson::DateTime(self.timestamp));
        document.insert(PAYLOAD_FIELD, serialize_to_bson(&self.payload)?);

        Ok(document)
    }

    /// Rebuilds a record from a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`CommandStoreError::Serialization`] if either reserved field is missing
    /// or malformed.
    pub fn from_document(mut document: Document) -> CommandStoreResult<Self> {
        let timestamp = match document.remove(TIMESTAMP_FIELD) {
            Some(Bson::DateTime(timestamp)) => timestamp,
            _ => {
                return Err(CommandStoreError::Serialization(format!(
                    "stored record has no {TIMESTAMP_FIELD}"
                )));
            }
        };
        let payload = match document.remove(PAYLOAD_FIELD) {
            Some(payload) => deserialize_from_bson::<Value>(payload)?,
            None => {
                return Err(CommandStoreError::Serialization(format!(
                    "stored record has no {PAYLOAD_FIELD}"
                )));
            }
        };

        Ok(Self {
            fields: document,
            timestamp,
            payload,
        })
    }

    /// The value emitted to query clients: the payload, optionally annotated with the
    /// record's timestamp under `timestamp_property`.
    ///
    /// Non-object payloads are returned untouched.
    pub fn into_output(self, timestamp_property: Option<&str>) -> Value {
        let mut payload = self.payload;

        if let (Some(property), Value::Object(map)) = (timestamp_property, &mut payload) {
            map.insert(
                property.to_string(),
                Value::String(format_timestamp(self.timestamp)),
            );
        }

        payload
    }
}

/// Formats a stored timestamp as RFC 3339 in UTC with millisecond precision.
pub fn format_timestamp(timestamp: DateTime) -> String {
    timestamp
        .to_chrono()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
