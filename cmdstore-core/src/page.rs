//! Query windows and the pagination metadata reported with every page.
//!
//! Pages are addressed by a 1-based `position` (the first record returned) and a
//! `limit`. Without an explicit position the window is anchored at the tail of the
//! matching records: `position = total_count - limit` is reported, and the page holds
//! the last `limit` records, so it always ends on the newest one.
//!
//! # Example
//!
//! ```ignore
//! let window = QueryWindow::paginate(25, &QueryOptions::default(), &StoreConfig::default());
//!
//! assert_eq!(window.position, 15);
//! assert_eq!(window.skip(), Some(15));
//! ```

use serde::{Deserialize, Serialize};

use crate::{config::StoreConfig, options::QueryOptions};

/// The slice of matching records one query returns.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    /// 1-based position of the first record. May be out of range.
    pub position: i64,
    /// Maximum number of records in the page.
    pub limit: usize,
    /// Number of records matching the query.
    pub total_count: u64,
    /// Whether the position was defaulted to the tail rather than requested.
    pub anchored: bool,
}

impl QueryWindow {
    /// Computes the effective window for a query.
    ///
    /// The limit is the requested one or the configured default, capped at the
    /// configured maximum either way.
    pub fn paginate(total_count: u64, options: &QueryOptions, config: &StoreConfig) -> Self {
        let limit = options
            .limit
            .unwrap_or(config.default_limit)
            .min(config.max_limit);
        let (position, anchored) = match options.position {
            Some(position) => (position, false),
            None => (clamp_i64(total_count) - clamp_i64(limit as u64), true),
        };

        Self {
            position,
            limit,
            total_count,
            anchored,
        }
    }

    /// Whether the window starts on an existing record.
    ///
    /// An out-of-bounds window is answered with an empty page, not an error.
    pub fn in_bounds(&self) -> bool {
        self.position >= 1 && self.position <= clamp_i64(self.total_count)
    }

    /// Number of matching records to skip, or `None` for an out-of-bounds window.
    ///
    /// A tail-anchored window skips `position` records so its page ends on the last
    /// matching record.
    pub fn skip(&self) -> Option<usize> {
        let skip = if self.anchored {
            self.position
        } else {
            self.position - 1
        };

        self.in_bounds().then(|| usize::try_from(skip).unwrap_or(usize::MAX))
    }

    /// 1-based position of the first record actually on the page.
    pub fn first_position(&self) -> i64 {
        if self.anchored {
            self.position.saturating_add(1)
        } else {
            self.position
        }
    }

    pub fn has_next(&self) -> bool {
        clamp_i64(self.total_count) > self.position.saturating_add(clamp_i64(self.limit as u64))
    }

    pub fn has_prev(&self) -> bool {
        self.position > 1
    }

    pub fn metadata(&self) -> PageMetadata {
        PageMetadata {
            page_size: self.limit,
            position: self.position,
            total_records: self.total_count,
        }
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// The `metadata` member of a query response envelope.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub page_size: usize,
    pub position: i64,
    pub total_records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StoreConfig {
        StoreConfig::builder()
            .with_default_limit(10)
            .with_max_limit(50)
            .build()
            .unwrap()
    }

    fn options(position: Option<i64>, limit: Option<usize>) -> QueryOptions {
        QueryOptions {
            position,
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn empty_collection_is_out_of_bounds() {
        let window = QueryWindow::paginate(0, &QueryOptions::default(), &config());

        assert!(window.position < 1);
        assert!(!window.in_bounds());
        assert_eq!(window.skip(), None);
        assert_eq!(window.metadata().total_records, 0);
    }

    #[test]
    fn default_window_anchors_at_tail() {
        let window = QueryWindow::paginate(25, &QueryOptions::default(), &config());

        assert_eq!(window.position, 15);
        assert_eq!(window.limit, 10);
        assert!(window.anchored);
        assert_eq!(window.skip(), Some(15));
        assert!(!window.has_next());
        assert!(window.has_prev());
    }

    #[test]
    fn explicit_position_skips_the_records_before_it() {
        let window = QueryWindow::paginate(25, &options(Some(15), None), &config());

        assert!(!window.anchored);
        assert_eq!(window.skip(), Some(14));
    }

    #[test]
    fn next_exists_only_strictly_before_the_end() {
        let at_edge = QueryWindow::paginate(25, &options(Some(15), None), &config());
        let before_edge = QueryWindow::paginate(25, &options(Some(14), None), &config());

        assert!(!at_edge.has_next());
        assert!(before_edge.has_next());
    }

    #[test]
    fn explicit_limit_is_capped() {
        let window = QueryWindow::paginate(500, &options(Some(1), Some(80)), &config());

        assert_eq!(window.limit, 50);
        assert_eq!(window.position, 1);
        assert!(!window.has_prev());
    }

    #[test]
    fn default_limit_is_capped_too() {
        let config = StoreConfig {
            default_limit: 40,
            max_limit: 20,
            ..StoreConfig::default()
        };

        assert_eq!(QueryWindow::paginate(5, &QueryOptions::default(), &config).limit, 20);
    }

    #[test]
    fn position_past_the_end_is_out_of_bounds() {
        let window = QueryWindow::paginate(5, &options(Some(6), None), &config());

        assert!(!window.in_bounds());
        assert!(QueryWindow::paginate(5, &options(Some(5), None), &config()).in_bounds());
    }

    #[test]
    fn metadata_reports_window() {
        let metadata =
            QueryWindow::paginate(25, &options(Some(3), Some(4)), &config()).metadata();

        assert_eq!(
            metadata,
            PageMetadata {
                page_size: 4,
                position: 3,
                total_records: 25,
            }
        );
    }
}
