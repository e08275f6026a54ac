//! Predicate evaluation for in-memory record filtering.
//!
//! This module evaluates compiled [`Expr`] predicates directly against stored BSON
//! documents.

use bson::{Bson, DateTime, Document};
use std::cmp::Ordering;

use cmdstore_core::{
    error::CommandStoreError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Type-erased, comparable representation of BSON values.
///
/// All numeric types are normalized to f64 so an `Int64` filter value matches an
/// `Int32` or `Double` stored value of the same magnitude.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    /// Anything else (documents, arrays, binary...). Never equal to anything.
    Opaque,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            _ => Comparable::Opaque,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

pub(crate) struct RecordEvaluator<'a> {
    document: &'a Document,
}

impl<'a> RecordEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Whether the document satisfies `filter`. No filter matches everything.
    pub fn matches(
        document: &'a Document,
        filter: Option<&Expr>,
    ) -> Result<bool, CommandStoreError> {
        match filter {
            Some(expr) => RecordEvaluator::new(document).visit_expr(expr),
            None => Ok(true),
        }
    }
}

impl QueryVisitor for RecordEvaluator<'_> {
    type Output = bool;
    type Error = CommandStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(field) else {
            return Ok(false);
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => left == right,
            FieldOp::Gte => matches!(
                left.partial_cmp(&right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FieldOp::Lte => matches!(
                left.partial_cmp(&right),
                Some(Ordering::Less | Ordering::Equal)
            ),
        })
    }
}
