//! Backend-agnostic predicates and storage queries.
//!
//! The query compiler ([`crate::compile`]) produces an [`Expr`]; each backend turns it
//! into something it can execute by implementing [`QueryVisitor`]: the in-memory backend
//! evaluates it against every record, the MongoDB backend translates it into a filter
//! document.
//!
//! ```ignore
//! use cmdstore::query::{Expr, StoreQuery};
//!
//! let query = StoreQuery::builder()
//!     .filter(Expr::eq("level", "warn").and(Expr::gte("_timestamp", start)))
//!     .skip(20)
//!     .limit(10)
//!     .build();
//! ```

use bson::Bson;

use crate::error::CommandStoreError;

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Greater than or equal to.
    Gte,
    /// Less than or equal to.
    Lte,
}

/// A predicate over stored records.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match). An empty list matches everything.
    And(Vec<Expr>),
    /// Field comparison expression.
    Field {
        /// The top-level field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: impl Into<String>, op: FieldOp, value: impl Into<Bson>) -> Self {
        Expr::Field {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(field, FieldOp::Eq, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(field, FieldOp::Gte, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::field(field, FieldOp::Lte, value)
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Whether this expression matches every record.
    pub fn is_empty(&self) -> bool {
        matches!(self, Expr::And(list) if list.iter().all(Expr::is_empty))
    }
}

/// What a backend is asked to count or stream: a predicate plus a window
/// over the matching records in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    /// Optional predicate; `None` matches every record.
    pub filter: Option<Expr>,
    /// Number of matching records to skip.
    pub skip: Option<usize>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl StoreQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> StoreQueryBuilder {
        StoreQueryBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreQueryBuilder {
    query: StoreQuery,
}

impl StoreQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the predicate. An expression that matches everything is stored as `None`.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = if filter.is_empty() { None } else { Some(filter) };
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.query.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn build(self) -> StoreQuery {
        self.query
    }
}

/// Walks an [`Expr`] tree. Backends implement this to evaluate or translate predicates.
pub trait QueryVisitor {
    type Output;
    type Error: Into<CommandStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}
