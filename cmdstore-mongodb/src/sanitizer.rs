//! Reversible key escaping for MongoDB compatibility.
//!
//! Payloads are arbitrary client JSON, but MongoDB rejects or misinterprets keys that
//! contain `.` or start with `$`. Keys are percent-escaped on the way in and restored on
//! the way out; values are never touched.

use bson::{Bson, Document};

pub(crate) struct KeySanitizer;

impl KeySanitizer {
    /// `%` comes first on escape and last on restore so the mapping stays reversible.
    const ESCAPES: [(&'static str, &'static str); 3] = [("%", "%25"), (".", "%2E"), ("$", "%24")];

    pub(crate) fn escape_key(key: &str) -> String {
        Self::ESCAPES
            .iter()
            .fold(key.to_string(), |key, (raw, escaped)| key.replace(raw, escaped))
    }

    pub(crate) fn restore_key(key: &str) -> String {
        Self::ESCAPES
            .iter()
            .rev()
            .fold(key.to_string(), |key, (raw, escaped)| key.replace(escaped, raw))
    }

    pub(crate) fn escape_document(document: Document) -> Document {
        document
            .into_iter()
            .map(|(key, value)| {
                (
                    Self::escape_key(&key),
                    Self::map_nested(value, Self::escape_document),
                )
            })
            .collect()
    }

    pub(crate) fn restore_document(document: Document) -> Document {
        document
            .into_iter()
            .map(|(key, value)| {
                (
                    Self::restore_key(&key),
                    Self::map_nested(value, Self::restore_document),
                )
            })
            .collect()
    }

    fn map_nested(value: Bson, f: fn(Document) -> Document) -> Bson {
        match value {
            Bson::Document(document) => Bson::Document(f(document)),
            Bson::Array(items) => Bson::Array(
                items
                    .into_iter()
                    .map(|item| Self::map_nested(item, f))
                    .collect(),
            ),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn escapes_dots_dollars_and_percent() {
        assert_eq!(KeySanitizer::escape_key("a.b"), "a%2Eb");
        assert_eq!(KeySanitizer::escape_key("$set"), "%24set");
        assert_eq!(KeySanitizer::escape_key("100%"), "100%25");
        assert_eq!(KeySanitizer::escape_key("_payload"), "_payload");
    }

    #[test]
    fn restore_inverts_escape() {
        for key in ["a.b", "$x", "50%2E", "%", "plain"] {
            assert_eq!(KeySanitizer::restore_key(&KeySanitizer::escape_key(key)), key);
        }
    }

    #[test]
    fn nested_keys_are_escaped_and_values_kept() {
        let document = doc! {
            "_payload": { "host.name": "a.b", "tags": [{ "$k": "$v" }] },
        };

        let escaped = KeySanitizer::escape_document(document.clone());
        let payload = escaped.get_document("_payload").unwrap();

        assert_eq!(payload.get_str("host%2Ename").unwrap(), "a.b");
        assert_eq!(KeySanitizer::restore_document(escaped), document);
    }
}
