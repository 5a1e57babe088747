//! Parallel XPath Evaluation
//!
//! Uses Rayon to evaluate several expressions against one context. Every
//! worker starts from its own clone of the context cursor.

use rayon::prelude::*;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::xpath::{evaluate, evaluate_with, Namespaces};

/// Evaluate multiple XPath expressions in parallel
///
/// Results are returned in the order of `exprs`; one failing expression
/// does not affect the others.
pub fn evaluate_parallel(context: &Cursor, exprs: &[&str]) -> Vec<Result<Vec<Cursor>>> {
    exprs
        .par_iter()
        .map(|expr| {
            let context = context.clone();
            evaluate(&context, expr).map(Iterator::collect)
        })
        .collect()
}

/// Parallel keyed evaluation: `(key, expr)` pairs to `(key, matches)`
///
/// Fails with the first error in input order.
pub fn evaluate_map(
    context: &Cursor,
    queries: &[(&str, &str)],
    namespaces: &Namespaces,
) -> Result<Vec<(String, Vec<Cursor>)>> {
    queries
        .par_iter()
        .map(|(key, expr)| {
            let context = context.clone();
            evaluate_with(&context, expr, namespaces).map(|m| (key.to_string(), m.collect()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Error};

    const XML: &str = "<root><a/><b/><b/><c x=\"1\"/></root>";

    #[test]
    fn test_parallel_eval() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let before = root.clone();

        let results = evaluate_parallel(&root, &["//a", "//b", "c/@x", "//a["]);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().len(), 1);
        assert_eq!(results[1].as_ref().unwrap().len(), 2);
        assert_eq!(results[2].as_ref().unwrap()[0].name(), Some("x"));
        assert!(matches!(results[3], Err(Error::PathSyntax { .. })));
        assert_eq!(root, before);
    }

    #[test]
    fn test_matches_sequential_evaluation() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let exprs = ["*", "//b[2]", "c/.."];
        for (expr, parallel) in exprs.iter().zip(evaluate_parallel(&root, &exprs)) {
            let sequential: Vec<Cursor> = evaluate(&root, expr).unwrap().collect();
            assert_eq!(parallel.unwrap(), sequential);
        }
    }

    #[test]
    fn test_evaluate_map() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let results = evaluate_map(&root, &[("first", "//a"), ("second", "//b")], &Namespaces::new()).unwrap();
        assert_eq!(results[0].0, "first");
        assert_eq!(results[1].1.len(), 2);

        assert!(evaluate_map(&root, &[("ok", "//a"), ("bad", "//p:a")], &Namespaces::new()).is_err());
    }
}
