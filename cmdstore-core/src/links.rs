//! HATEOAS navigation links for query responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    options::{LIMIT, POSITION, QueryParams},
    page::QueryWindow,
};

/// A single navigation link.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub method: String,
    pub rel: String,
}

impl Link {
    fn get(href: String, rel: &str) -> Self {
        Self {
            href,
            method: "GET".to_string(),
            rel: rel.to_string(),
        }
    }
}

/// The `links` member of a query response envelope.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Links {
    pub latest: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Link>,
    #[serde(rename = "self")]
    pub current: Link,
}

/// Joins the configured base URL and a collection path, percent-encoding each path
/// segment.
pub fn collection_url(base_url: &str, path: &str) -> String {
    let path = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    format!("{base_url}{path}")
}

/// Builds the links of a page.
///
/// `url` is the bare collection URL. Every href except `latest` repeats the caller's
/// parameters with the window's position and limit written over them. The previous page
/// never starts before position 1: when stepping back a full limit would, it starts at 1
/// and shrinks to the records in between.
pub fn build_links(window: &QueryWindow, url: &str, params: &QueryParams, marker: char) -> Links {
    let href = |position: i64, limit: i64| {
        format!("{url}?{}", query_string(params, marker, position, limit))
    };
    let limit = i64::try_from(window.limit).unwrap_or(i64::MAX);

    let next = window
        .has_next()
        .then(|| Link::get(href(window.position + limit, limit), "next"));

    let prev = window.has_prev().then(|| {
        let first = window.first_position();
        let position = first - limit;
        if position < 1 {
            Link::get(href(1, first - 1), "prev")
        } else {
            Link::get(href(position, limit), "prev")
        }
    });

    Links {
        latest: Link::get(url.to_string(), "latest"),
        next,
        prev,
        current: Link::get(href(window.position, limit), "self"),
    }
}

fn query_string(params: &QueryParams, marker: char, position: i64, limit: i64) -> String {
    let mut pairs = BTreeMap::new();

    for (key, value) in &params.filter {
        pairs.insert(key.clone(), value.clone());
    }
    for (key, value) in &params.options {
        pairs.insert(format!("{marker}{key}"), value.clone());
    }
    pairs.insert(format!("{marker}{POSITION}"), position.to_string());
    pairs.insert(format!("{marker}{LIMIT}"), limit.to_string());

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(position: i64, limit: usize, total_count: u64) -> QueryWindow {
        QueryWindow {
            position,
            limit,
            total_count,
            anchored: false,
        }
    }

    #[test]
    fn tail_window_has_prev_but_no_next() {
        let links = build_links(&window(15, 10, 25), "/logs", &QueryParams::new(), '~');

        assert_eq!(links.latest.href, "/logs");
        assert!(links.next.is_none());
        assert_eq!(links.prev.unwrap().href, "/logs?~limit=10&~position=5");
        assert_eq!(links.current.href, "/logs?~limit=10&~position=15");
        assert_eq!(links.current.method, "GET");
        assert_eq!(links.current.rel, "self");
    }

    #[test]
    fn anchored_prev_steps_back_from_the_first_record_on_the_page() {
        let window = QueryWindow {
            anchored: true,
            ..window(15, 10, 25)
        };
        let links = build_links(&window, "/logs", &QueryParams::new(), '~');

        assert!(links.next.is_none());
        assert_eq!(links.prev.unwrap().href, "/logs?~limit=10&~position=6");
        assert_eq!(links.current.href, "/logs?~limit=10&~position=15");
    }

    #[test]
    fn collection_paths_are_encoded_per_segment() {
        assert_eq!(collection_url("", "/logs"), "/logs");
        assert_eq!(
            collection_url("https://h", "/audit/log ins?x"),
            "https://h/audit/log%20ins%3Fx"
        );
    }

    #[test]
    fn first_window_has_next_but_no_prev() {
        let links = build_links(&window(1, 10, 25), "/logs", &QueryParams::new(), '~');

        assert!(links.prev.is_none());
        assert_eq!(links.next.unwrap().href, "/logs?~limit=10&~position=11");
    }

    #[test]
    fn prev_is_clamped_to_the_start() {
        let links = build_links(&window(4, 10, 25), "/logs", &QueryParams::new(), '~');

        assert_eq!(links.prev.unwrap().href, "/logs?~limit=3&~position=1");
    }

    #[test]
    fn caller_parameters_are_kept_and_overridden() {
        let params = QueryParams::new()
            .with_filter("level", "warn")
            .with_filter("note", "a b&c")
            .with_option("position", "99")
            .with_option("timestampProperty", "at");

        let links = build_links(&window(2, 5, 20), "http://h/logs", &params, '~');

        assert_eq!(
            links.current.href,
            "http://h/logs?level=warn&note=a%20b%26c&~limit=5&~position=2&~timestampProperty=at"
        );
    }

    #[test]
    fn serializes_self_and_omits_missing_links() {
        let links = build_links(&window(1, 10, 3), "/logs", &QueryParams::new(), '~');
        let json = serde_json::to_value(&links).unwrap();

        assert!(json.get("self").is_some());
        assert!(json.get("next").is_none());
        assert!(json.get("prev").is_none());
        assert_eq!(json["latest"]["rel"], "latest");
    }
}
