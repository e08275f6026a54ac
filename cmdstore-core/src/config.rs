//! Store configuration.
//!
//! [`StoreConfig`] derives `Deserialize` with per-field defaults so a host can load it
//! from whatever format it already uses for its own settings. In code, prefer
//! [`StoreConfig::builder`].
//!
//! # Example
//!
//! ```ignore
//! use cmdstore::config::StoreConfig;
//!
//! let config = StoreConfig::builder()
//!     .with_default_limit(25)
//!     .with_max_limit(500)
//!     .with_base_url("http://localhost:8080")
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CommandStoreError, CommandStoreResult};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;
const OPTION_MARKER: char = '~';

/// Tunables for the command store engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Page size used when a query does not ask for one.
    pub default_limit: usize,
    /// Upper bound applied to every page size, requested or default.
    pub max_limit: usize,
    /// Prefix separating query options (`~limit`) from filter keys in a query string.
    pub option_marker: char,
    /// Prepended to every navigation link href, e.g. `http://host:8080`.
    pub base_url: String,
}

impl StoreConfig {
    /// Creates a new builder starting from the defaults.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    /// Checks the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CommandStoreError::Config`] if either limit is zero or the default
    /// exceeds the maximum.
    pub fn validate(&self) -> CommandStoreResult<()> {
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(CommandStoreError::Config(
                "page limits must be at least 1".to_string(),
            ));
        }
        if self.default_limit > self.max_limit {
            return Err(CommandStoreError::Config(format!(
                "default limit {} exceeds max limit {}",
                self.default_limit, self.max_limit
            )));
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            option_marker: OPTION_MARKER,
            base_url: String::new(),
        }
    }
}

/// Builder for [`StoreConfig`].
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    pub fn with_max_limit(mut self, limit: usize) -> Self {
        self.config.max_limit = limit;
        self
    }

    pub fn with_option_marker(mut self, marker: char) -> Self {
        self.config.option_marker = marker;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// See [`StoreConfig::validate`].
    pub fn build(self) -> CommandStoreResult<StoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StoreConfig::default();

        assert_eq!(config.default_limit, 10);
        assert_eq!(config.option_marker, '~');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_default_above_max() {
        let result = StoreConfig::builder()
            .with_default_limit(50)
            .with_max_limit(20)
            .build();

        assert!(matches!(result, Err(CommandStoreError::Config(_))));
    }

    #[test]
    fn rejects_zero_limit() {
        assert!(StoreConfig::builder().with_max_limit(0).build().is_err());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"max_limit": 250}"#).unwrap();

        assert_eq!(config.max_limit, 250);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.base_url, "");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let config = StoreConfig::builder()
            .with_base_url("http://localhost:8080/")
            .build()
            .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
    }
}
