//! Schema-driven validation and normalization of appended records.

use bson::{Bson, DateTime, Document, ser::serialize_to_bson};
use serde_json::Value;

use crate::{
    error::{CommandStoreError, CommandStoreResult},
    record::{PAYLOAD_FIELD, Record},
    schema::CollectionSchema,
};

pub const MISSING_REQUIRED: &str = "missing required property";
pub const VALIDATION_FAILED: &str = "validation failed";

/// Turns a raw appended object into a [`Record`], or names the first field (in
/// registration order) that violates the schema.
///
/// The schema transform, if any, runs first; its output is both the extraction
/// source and the stored payload. Pure apart from reading the clock.
///
/// # Errors
///
/// Returns [`CommandStoreError::Validation`] if the input is not an object or a field
/// breaks its rule, and [`CommandStoreError::Serialization`] if an indexed value has
/// no BSON representation.
pub fn normalize(schema: &CollectionSchema, input: Value) -> CommandStoreResult<Record> {
    let input = match schema.transform() {
        Some(transform) => transform(input),
        None => input,
    };

    let Value::Object(object) = &input else {
        return Err(CommandStoreError::validation(
            PAYLOAD_FIELD,
            "expected a JSON object",
        ));
    };

    let mut fields = Document::new();

    for (name, rule) in schema.fields() {
        let provided = object.get(name);

        if rule.required && provided.is_none() {
            return Err(CommandStoreError::validation(name, MISSING_REQUIRED));
        }

        // Absent with no default: indexed as null, unchecked.
        let Some(mut value) = provided.cloned().or_else(|| rule.default_value.clone()) else {
            fields.insert(name, Bson::Null);
            continue;
        };

        if let Some(field_type) = rule.field_type {
            if !field_type.matches(&value) {
                return Err(CommandStoreError::validation(
                    name,
                    format!("invalid type, expected {field_type}"),
                ));
            }
        }

        if let Some(validator) = &rule.validator {
            if !validator(&value) {
                return Err(CommandStoreError::validation(name, VALIDATION_FAILED));
            }
        }

        if let Some(derive) = &rule.derive_value {
            value = derive(value);
        }

        fields.insert(name, serialize_to_bson(&value)?);
    }

    Ok(Record {
        fields,
        timestamp: DateTime::now(),
        payload: input,
    })
}
