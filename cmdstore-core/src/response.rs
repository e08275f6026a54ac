//! The structured result handed back to the transport layer.
//!
//! Every public store operation resolves to a [`Response`]: a status code, a content
//! type and a body. Query bodies are streamed: the JSON envelope
//!
//! ```text
//! {"links": {...}, "metadata": {...}, "values": [v1,v2,...]}
//! ```
//!
//! is emitted in chunks, header first, one chunk per value, closing bracket last. The
//! next value is only pulled from storage when the consumer polls for it.

use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use serde_json::{Value, json};
use std::fmt;
use tracing::error;

use crate::{
    error::{CommandStoreError, CommandStoreResult},
    links::Links,
    page::PageMetadata,
};

pub const CONTENT_TYPE_JSON: &str = "application/json";

const INTERNAL_ERROR: &str = "Internal Server Error";

/// Body of a [`Response`].
pub enum ResponseBody {
    Empty,
    Json(Value),
    /// Lazily produced JSON text chunks.
    Stream(BoxStream<'static, String>),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => f.write_str("Empty"),
            ResponseBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[derive(Debug)]
pub struct Response {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: ResponseBody,
}

impl Response {
    /// A successful response without a body.
    pub fn empty() -> Self {
        Self {
            status_code: 200,
            content_type: CONTENT_TYPE_JSON,
            body: ResponseBody::Empty,
        }
    }

    pub fn json(status_code: u16, value: Value) -> Self {
        Self {
            status_code,
            content_type: CONTENT_TYPE_JSON,
            body: ResponseBody::Json(value),
        }
    }

    pub fn stream(chunks: BoxStream<'static, String>) -> Self {
        Self {
            status_code: 200,
            content_type: CONTENT_TYPE_JSON,
            body: ResponseBody::Stream(chunks),
        }
    }

    /// Maps an error to its response. Only validation and lookup errors expose their
    /// message; everything else gets a generic body.
    pub fn from_error(err: &CommandStoreError) -> Self {
        let body = match err {
            CommandStoreError::Validation { field, reason } => json!({
                "error": reason,
                "property": field,
            }),
            err if err.is_client_visible() => json!({ "error": err.to_string() }),
            _ => json!({ "error": INTERNAL_ERROR }),
        };

        Self::json(err.status_code(), body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Drains the body into a string. Meant for tests and small responses.
    pub async fn into_text(self) -> String {
        match self.body {
            ResponseBody::Empty => String::new(),
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Stream(chunks) => chunks.collect::<Vec<_>>().await.concat(),
        }
    }
}

/// Serializes the part of the envelope that precedes the first value.
pub(crate) fn envelope_header(
    links: &Links,
    metadata: &PageMetadata,
) -> CommandStoreResult<String> {
    Ok(format!(
        r#"{{"links":{},"metadata":{},"values":["#,
        serde_json::to_string(links)?,
        serde_json::to_string(metadata)?,
    ))
}

struct Envelope {
    path: String,
    header: Option<String>,
    values: Option<BoxStream<'static, CommandStoreResult<Value>>>,
    first_value: bool,
    closed: bool,
}

/// Frames a value stream as a response envelope.
///
/// A storage error after the header has gone out cannot change the status code any
/// more; it is logged and the envelope is closed early. The value stream is dropped as
/// soon as it ends, and with the returned stream if the consumer goes away.
pub(crate) fn envelope(
    path: &str,
    header: String,
    values: Option<BoxStream<'static, CommandStoreResult<Value>>>,
) -> BoxStream<'static, String> {
    let envelope = Envelope {
        path: path.to_string(),
        header: Some(header),
        values,
        first_value: true,
        closed: false,
    };

    stream::unfold(envelope, |mut envelope| async move {
        if let Some(header) = envelope.header.take() {
            return Some((header, envelope));
        }
        if envelope.closed {
            return None;
        }

        if let Some(values) = envelope.values.as_mut() {
            match values.next().await {
                Some(Ok(value)) => {
                    let chunk = if envelope.first_value {
                        value.to_string()
                    } else {
                        format!(",{value}")
                    };
                    envelope.first_value = false;

                    return Some((chunk, envelope));
                }
                Some(Err(err)) => {
                    error!(
                        path = %envelope.path,
                        error = %err,
                        "query stream failed, closing response early"
                    );
                }
                None => {}
            }
        }

        envelope.values = None;
        envelope.closed = true;

        Some(("]}".to_string(), envelope))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{links::build_links, options::QueryParams, page::QueryWindow};

    fn header() -> String {
        let window = QueryWindow {
            position: 1,
            limit: 10,
            total_count: 2,
            anchored: false,
        };
        envelope_header(
            &build_links(&window, "/logs", &QueryParams::new(), '~'),
            &window.metadata(),
        )
        .unwrap()
    }

    fn values(
        items: Vec<CommandStoreResult<Value>>,
    ) -> Option<BoxStream<'static, CommandStoreResult<Value>>> {
        Some(stream::iter(items).boxed())
    }

    #[tokio::test]
    async fn header_is_flushed_first_and_values_are_comma_separated() {
        let items = values(vec![Ok(json!({"a": 1})), Ok(json!({"a": 2}))]);
        let chunks = envelope("/logs", header(), items).collect::<Vec<_>>().await;

        assert_eq!(chunks.len(), 4);
        assert!(chunks[0].starts_with(r#"{"links":"#));
        assert_eq!(chunks[1], r#"{"a":1}"#);
        assert_eq!(chunks[2], r#",{"a":2}"#);
        assert_eq!(chunks[3], "]}");

        let body: Value = serde_json::from_str(&chunks.concat()).unwrap();
        assert_eq!(body["values"], json!([{"a": 1}, {"a": 2}]));
        assert_eq!(body["metadata"]["total_records"], json!(2));
    }

    #[tokio::test]
    async fn empty_page_still_emits_header_once() {
        let chunks = envelope("/logs", header(), None).collect::<Vec<_>>().await;

        assert_eq!(chunks.len(), 2);
        let body: Value = serde_json::from_str(&chunks.concat()).unwrap();
        assert_eq!(body["values"], json!([]));
        assert!(body["links"]["self"].is_object());
    }

    #[tokio::test]
    async fn storage_error_closes_envelope() {
        let items = vec![
            Ok(json!(1)),
            Err(CommandStoreError::Storage("cursor died".into())),
            Ok(json!(2)),
        ];
        let text = envelope("/logs", header(), values(items)).collect::<Vec<_>>().await.concat();

        let body: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["values"], json!([1]));
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let err = CommandStoreError::Storage("db at 10.0.0.3 down".into());
        let response = Response::from_error(&err);

        assert_eq!(response.status_code, 500);
        match response.body {
            ResponseBody::Json(body) => assert_eq!(body, json!({ "error": INTERNAL_ERROR })),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn validation_errors_name_the_property() {
        let err = CommandStoreError::validation("type", "validation failed");
        let response = Response::from_error(&err);

        assert_eq!(response.status_code, 500);
        match response.body {
            ResponseBody::Json(body) => assert_eq!(body["property"], json!("type")),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn not_found_is_404() {
        let err = CommandStoreError::NotFound("/x".into());

        assert_eq!(Response::from_error(&err).status_code, 404);
    }
}
