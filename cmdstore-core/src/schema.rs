//! Collection schemas and the registry that owns them.
//!
//! A [`CollectionSchema`] declares, in order, the index fields extracted from every record
//! appended to a collection path, with per-field rules ([`FieldRule`]), plus an optional
//! whole-record [`Transform`]. Schemas are registered once at startup into a
//! [`SchemaRegistry`] and are read-only afterwards.
//!
//! # Example
//!
//! ```ignore
//! use cmdstore::schema::{CollectionSchema, FieldRule, FieldType};
//!
//! let schema = CollectionSchema::builder("/logs")
//!     .field(
//!         "level",
//!         FieldRule::new()
//!             .required()
//!             .with_type(FieldType::String)
//!             .with_validator(|v| matches!(v.as_str(), Some("info" | "warn" | "error"))),
//!     )
//!     .field("attempt", FieldRule::new().with_type(FieldType::Number).with_default(1))
//!     .build();
//! ```

use serde_json::Value;
use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use crate::{
    error::{CommandStoreError, CommandStoreResult},
    record::{PAYLOAD_FIELD, TIMESTAMP_FIELD},
};

/// Predicate a field value must satisfy.
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
/// Maps a validated field value to the value that gets indexed.
pub type Deriver = Arc<dyn Fn(Value) -> Value + Send + Sync>;
/// Rewrites a whole appended object before indexing; the result is also the stored payload.
pub type Transform = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// The JSON type an index field must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Number,
    String,
}

impl FieldType {
    /// Whether `value` is of this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::Bool => value.is_boolean(),
            FieldType::Number => value.is_number(),
            FieldType::String => value.is_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Number => "number",
            FieldType::String => "string",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = CommandStoreError;

    /// Parses a type name as found in host configuration files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" | "boolean" => Ok(FieldType::Bool),
            "number" => Ok(FieldType::Number),
            "string" => Ok(FieldType::String),
            other => Err(CommandStoreError::Config(format!(
                "unsupported field type {other:?}, expected bool, number or string"
            ))),
        }
    }
}

/// Rules applied to one index field.
#[derive(Clone, Default)]
pub struct FieldRule {
    pub default_value: Option<Value>,
    pub required: bool,
    pub field_type: Option<FieldType>,
    pub validator: Option<Validator>,
    pub derive_value: Option<Deriver>,
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects records that do not carry this field. A default value does not satisfy it.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_derive<F>(mut self, derive: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.derive_value = Some(Arc::new(derive));
        self
    }
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("default_value", &self.default_value)
            .field("required", &self.required)
            .field("field_type", &self.field_type)
            .field("validator", &self.validator.is_some())
            .field("derive_value", &self.derive_value.is_some())
            .finish()
    }
}

/// The declared index fields of one collection path.
#[derive(Clone)]
pub struct CollectionSchema {
    path: String,
    fields: Vec<(String, FieldRule)>,
    transform: Option<Transform>,
}

impl CollectionSchema {
    pub fn builder(path: impl Into<String>) -> CollectionSchemaBuilder {
        CollectionSchemaBuilder::new(path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Index fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, rule)| rule)
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Checks the schema is registrable.
    ///
    /// # Errors
    ///
    /// Returns [`CommandStoreError::Config`] for an empty path, an empty, reserved or
    /// duplicated field name.
    pub fn validate(&self) -> CommandStoreResult<()> {
        if self.path.trim().is_empty() {
            return Err(CommandStoreError::Config(
                "collection path must not be empty".to_string(),
            ));
        }

        for (index, (name, _)) in self.fields.iter().enumerate() {
            if name.is_empty() {
                return Err(CommandStoreError::Config(format!(
                    "{}: field names must not be empty",
                    self.path
                )));
            }
            if name == TIMESTAMP_FIELD || name == PAYLOAD_FIELD {
                return Err(CommandStoreError::Config(format!(
                    "{}: field name {name} is reserved",
                    self.path
                )));
            }
            if self.fields[..index].iter().any(|(other, _)| other == name) {
                return Err(CommandStoreError::Config(format!(
                    "{}: field {name} is declared twice",
                    self.path
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for CollectionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSchema")
            .field("path", &self.path)
            .field("fields", &self.fields)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

pub struct CollectionSchemaBuilder {
    schema: CollectionSchema,
}

impl CollectionSchemaBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            schema: CollectionSchema {
                path: path.into(),
                fields: Vec::new(),
                transform: None,
            },
        }
    }

    /// Declares the next index field. Order of calls is validation order.
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.schema.fields.push((name.into(), rule));
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.schema.transform = Some(Arc::new(transform));
        self
    }

    pub fn build(self) -> CollectionSchema {
        self.schema
    }
}

/// Owns every registered schema, keyed by collection path.
///
/// Populated during startup through `&mut` access, then shared read-only.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<CollectionSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its path.
    ///
    /// # Errors
    ///
    /// Returns [`CommandStoreError::Config`] if the schema is invalid or the path is
    /// already registered.
    pub fn register(
        &mut self,
        schema: CollectionSchema,
    ) -> CommandStoreResult<Arc<CollectionSchema>> {
        schema.validate()?;

        if self.schemas.contains_key(schema.path()) {
            return Err(CommandStoreError::Config(format!(
                "collection {} is already registered",
                schema.path()
            )));
        }

        let schema = Arc::new(schema);
        self.schemas.insert(schema.path().to_string(), schema.clone());

        Ok(schema)
    }

    /// Looks up the schema of a path.
    ///
    /// # Errors
    ///
    /// Returns [`CommandStoreError::NotFound`] for unregistered paths.
    pub fn lookup(&self, path: &str) -> CommandStoreResult<&Arc<CollectionSchema>> {
        self.schemas
            .get(path)
            .ok_or_else(|| CommandStoreError::NotFound(path.to_string()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn levels() -> CollectionSchema {
        CollectionSchema::builder("/logs")
            .field("level", FieldRule::new().required().with_type(FieldType::String))
            .field("attempt", FieldRule::new().with_type(FieldType::Number))
            .build()
    }

    #[test]
    fn registers_and_looks_up() {
        let mut registry = SchemaRegistry::new();
        registry.register(levels()).unwrap();

        let schema = registry.lookup("/logs").unwrap();
        let names = schema.fields().map(|(name, _)| name).collect::<Vec<_>>();

        assert_eq!(names, vec!["level", "attempt"]);
        assert!(schema.field("level").unwrap().required);
    }

    #[test]
    fn unknown_path_is_not_found() {
        let registry = SchemaRegistry::new();

        assert_eq!(
            registry.lookup("/nope").unwrap_err(),
            CommandStoreError::NotFound("/nope".to_string())
        );
    }

    #[test]
    fn re_registration_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register(levels()).unwrap();

        assert!(matches!(
            registry.register(levels()),
            Err(CommandStoreError::Config(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reserved_and_duplicate_fields_are_rejected() {
        let reserved = CollectionSchema::builder("/a")
            .field("_timestamp", FieldRule::new())
            .build();
        let duplicate = CollectionSchema::builder("/b")
            .field("x", FieldRule::new())
            .field("x", FieldRule::new())
            .build();
        let unnamed = CollectionSchema::builder("").build();

        let mut registry = SchemaRegistry::new();
        assert!(registry.register(reserved).is_err());
        assert!(registry.register(duplicate).is_err());
        assert!(registry.register(unnamed).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn field_type_parses_config_names() {
        assert_eq!("boolean".parse::<FieldType>().unwrap(), FieldType::Bool);
        assert_eq!("number".parse::<FieldType>().unwrap(), FieldType::Number);
        assert!(matches!(
            "date".parse::<FieldType>(),
            Err(CommandStoreError::Config(_))
        ));
    }

    #[test]
    fn field_type_matches_json_types() {
        assert!(FieldType::Number.matches(&json!(1.5)));
        assert!(!FieldType::Number.matches(&json!("1.5")));
        assert!(FieldType::Bool.matches(&json!(false)));
        assert!(!FieldType::String.matches(&Value::Null));
    }
}
