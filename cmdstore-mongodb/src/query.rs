//! Predicate translation from cmdstore expressions to MongoDB filter documents.

use bson::{Bson, Document, doc};

use cmdstore_core::{
    error::CommandStoreError,
    query::{Expr, FieldOp, QueryVisitor},
};

use crate::sanitizer::KeySanitizer;

pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Translates an optional predicate; no predicate is the empty filter.
    pub(crate) fn translate(filter: Option<&Expr>) -> Result<Document, CommandStoreError> {
        match filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = CommandStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let operator = match op {
            FieldOp::Eq => "$eq",
            FieldOp::Gte => "$gte",
            FieldOp::Lte => "$lte",
        };
        let key = KeySanitizer::escape_key(field);

        Ok(doc! {
            key: { operator: value.clone() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::DateTime;

    #[test]
    fn translates_conjunction_of_comparisons() {
        let expr =
            Expr::eq("level", "warn").and(Expr::gte("_timestamp", DateTime::from_millis(10)));

        assert_eq!(
            MongoQueryTranslator::translate(Some(&expr)).unwrap(),
            doc! {
                "$and": [
                    { "level": { "$eq": "warn" } },
                    { "_timestamp": { "$gte": DateTime::from_millis(10) } },
                ]
            }
        );
    }

    #[test]
    fn empty_filters_match_everything() {
        assert_eq!(MongoQueryTranslator::translate(None).unwrap(), doc! {});
        assert_eq!(MongoQueryTranslator::translate(Some(&Expr::And(vec![]))).unwrap(), doc! {});
    }

    #[test]
    fn field_names_are_escaped() {
        assert_eq!(
            MongoQueryTranslator::translate(Some(&Expr::lte("a.b", 3))).unwrap(),
            doc! { "a%2Eb": { "$lte": 3 } }
        );
    }
}
