//! Compiles a request's filter and time bounds into a storage predicate.

use bson::Bson;
use std::collections::BTreeMap;

use crate::{
    options::QueryOptions,
    query::Expr,
    record::TIMESTAMP_FIELD,
    schema::{CollectionSchema, FieldType},
};

/// Builds the predicate for a query against `schema`.
///
/// Only keys declared by the schema take part; anything else in `filter` is ignored so
/// clients may send unrelated query parameters. Values that cannot be coerced to the
/// declared type are dropped rather than rejected, as are unparsable time bounds.
/// The start and end bounds are independent and both inclusive.
pub fn compile(
    schema: &CollectionSchema,
    filter: &BTreeMap<String, String>,
    options: &QueryOptions,
) -> Expr {
    let mut clauses = Vec::new();

    for (name, rule) in schema.fields() {
        let Some(raw) = filter.get(name) else {
            continue;
        };

        if let Some(value) = coerce(rule.field_type, raw) {
            clauses.push(Expr::eq(name, value));
        }
    }

    if let Some(start) = options.start_time {
        clauses.push(Expr::gte(TIMESTAMP_FIELD, start));
    }
    if let Some(end) = options.end_time {
        clauses.push(Expr::lte(TIMESTAMP_FIELD, end));
    }

    Expr::And(clauses)
}

/// Coerces a raw query-string value to the declared index type.
pub fn coerce(field_type: Option<FieldType>, raw: &str) -> Option<Bson> {
    match field_type {
        Some(FieldType::Bool) => match raw {
            "true" => Some(Bson::Boolean(true)),
            "false" => Some(Bson::Boolean(false)),
            _ => None,
        },
        Some(FieldType::Number) if raw.contains('.') => raw.parse::<f64>().ok().map(Bson::Double),
        Some(FieldType::Number) => raw.parse::<i64>().ok().map(Bson::Int64),
        Some(FieldType::String) | None => Some(Bson::String(raw.to_string())),
    }
}
