//! Query parameters as received from the transport layer.
//!
//! A query string is a flat list of key/value pairs. Keys carrying the configured option
//! marker (`~` by default) are query options, everything else is a filter on index fields:
//!
//! ```text
//! /logs?level=warn&~limit=20&~startTime=2024-01-01
//!        ^ filter   ^ options
//! ```

use bson::DateTime;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;

pub const POSITION: &str = "position";
pub const LIMIT: &str = "limit";
pub const START_TIME: &str = "startTime";
pub const END_TIME: &str = "endTime";
pub const TIMESTAMP_PROPERTY: &str = "timestampProperty";

/// Raw filter and option maps of one query request.
///
/// Option keys are stored without their marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub filter: BTreeMap<String, String>,
    pub options: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits decoded query-string pairs on the option marker. Later pairs win.
    pub fn from_pairs<I, K, V>(pairs: I, marker: char) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();

        for (key, value) in pairs {
            let key = key.into();
            if let Some(option) = key.strip_prefix(marker) {
                params.options.insert(option.to_string(), value.into());
            } else {
                params.filter.insert(key, value.into());
            }
        }

        params
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Parses the option map. Malformed values are ignored, never rejected.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::from_map(&self.options)
    }
}

/// Typed query options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Explicit 1-based position of the first returned record.
    pub position: Option<i64>,
    /// Requested page size, at least 1.
    pub limit: Option<usize>,
    pub start_time: Option<DateTime>,
    pub end_time: Option<DateTime>,
    /// Property the record timestamp is copied into on output.
    pub timestamp_property: Option<String>,
}

impl QueryOptions {
    pub fn from_map(options: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| options.get(key).map(|value| value.trim());

        Self {
            position: get(POSITION).and_then(|v| v.parse::<i64>().ok()),
            limit: get(LIMIT)
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|limit| *limit >= 1),
            start_time: get(START_TIME).and_then(parse_time),
            end_time: get(END_TIME).and_then(parse_time),
            timestamp_property: get(TIMESTAMP_PROPERTY)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        }
    }
}

/// Parses a time bound: epoch milliseconds, RFC 3339, a naive UTC date-time or a date.
pub fn parse_time(value: &str) -> Option<DateTime> {
    if let Ok(millis) = value.parse::<i64>() {
        return Some(DateTime::from_millis(millis));
    }
    if let Ok(millis) = value.parse::<f64>() {
        return millis
            .is_finite()
            .then(|| DateTime::from_millis(millis as i64));
    }
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(DateTime::from_chrono(parsed.with_timezone(&Utc)));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(DateTime::from_chrono(Utc.from_utc_datetime(&parsed)));
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return parsed
            .and_hms_opt(0, 0, 0)
            .map(|midnight| DateTime::from_chrono(Utc.from_utc_datetime(&midnight)));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_marker() {
        let params = QueryParams::from_pairs(
            vec![("level", "warn"), ("~limit", "5"), ("~position", "3"), ("host", "a")],
            '~',
        );

        assert_eq!(params.filter.len(), 2);
        assert_eq!(params.filter["level"], "warn");
        assert_eq!(params.options["limit"], "5");
        assert_eq!(params.options["position"], "3");
    }

    #[test]
    fn later_pairs_win() {
        let params = QueryParams::from_pairs(vec![("a", "1"), ("a", "2")], '~');

        assert_eq!(params.filter["a"], "2");
    }

    #[test]
    fn malformed_options_are_ignored() {
        let options = QueryParams::new()
            .with_option(POSITION, "abc")
            .with_option(LIMIT, "0")
            .with_option(START_TIME, "yesterday")
            .with_option(TIMESTAMP_PROPERTY, "")
            .query_options();

        assert_eq!(options, QueryOptions::default());
    }

    #[test]
    fn parses_well_formed_options() {
        let options = QueryParams::new()
            .with_option(POSITION, "7")
            .with_option(LIMIT, "25")
            .with_option(TIMESTAMP_PROPERTY, "at")
            .query_options();

        assert_eq!(options.position, Some(7));
        assert_eq!(options.limit, Some(25));
        assert_eq!(options.timestamp_property.as_deref(), Some("at"));
    }

    #[test]
    fn parses_time_formats() {
        let expected = DateTime::from_millis(1_704_067_200_000);

        assert_eq!(parse_time("1704067200000"), Some(expected));
        assert_eq!(parse_time("2024-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_time("2024-01-01T01:00:00+01:00"), Some(expected));
        assert_eq!(parse_time("2024-01-01T00:00:00"), Some(expected));
        assert_eq!(parse_time("2024-01-01"), Some(expected));
        assert_eq!(parse_time("not a date"), None);
    }
}
