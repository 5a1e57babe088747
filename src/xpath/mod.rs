//! XPath 1.0 Engine
//!
//! Location-path queries over a [`Document`](crate::Document):
//! - Forward and reverse axes except following, preceding and namespace
//! - A core function subset
//! - Compiled expression caching
//!
//! A path that starts with a single `/` is absolute. Any other path,
//! including one that starts with `//`, is scoped: its matches are limited
//! to the context node, the context's attributes, and its descendants.

pub(crate) mod axes;
pub(crate) mod cache;
pub(crate) mod compiler;
pub(crate) mod eval;
pub(crate) mod functions;
pub(crate) mod iter;
pub(crate) mod lexer;
pub(crate) mod namespaces;
pub(crate) mod parser;
pub(crate) mod value;

pub use iter::Matches;
pub use namespaces::Namespaces;

use crate::cursor::Cursor;
use crate::error::Result;

/// Evaluate `expr` against a clone of `context` with no prefix bindings
pub fn evaluate(context: &Cursor, expr: &str) -> Result<Matches> {
    evaluate_with(context, expr, &Namespaces::new())
}

/// Evaluate `expr` against a clone of `context`, resolving prefixed name
/// tests through `namespaces`
///
/// Syntax errors and unbound prefixes are reported here, before any match
/// is produced. Zero matches is an empty sequence, not an error.
pub fn evaluate_with(context: &Cursor, expr: &str, namespaces: &Namespaces) -> Result<Matches> {
    let path = cache::compiled(expr, namespaces)?;
    Ok(Matches::new(context, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Error};

    const XML: &str = r#"<D a="0"><Org id="1"><E><Name>Alice</Name></E><E/><E/></Org><Org id="2"><E><Name>Bob</Name></E><E/><E/></Org></D>"#;

    fn offsets(matches: Matches) -> Vec<usize> {
        matches.map(|c| c.fragment().offset).collect()
    }

    #[test]
    fn test_descendant_query_in_document_order() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let names: Vec<_> = evaluate(&root, "//Name").unwrap().collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].fragment().offset < names[1].fragment().offset);
        assert_eq!(names[0].element_text().unwrap(), Some("Alice".to_string()));
    }

    #[test]
    fn test_context_cursor_is_untouched() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let before = root.clone();
        let _ = evaluate(&root, "Org/E").unwrap().count();
        assert_eq!(root, before);
    }

    #[test]
    fn test_absolute_paths_escape_scope() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let org = evaluate(&root, "Org[2]").unwrap().next().unwrap();
        assert_eq!(evaluate(&org, "//E").unwrap().count(), 3);
        assert_eq!(evaluate(&org, "/D/Org/E").unwrap().count(), 6);
        assert_eq!(evaluate(&org, "..").unwrap().count(), 0);
        assert_eq!(evaluate(&org, "/").unwrap().count(), 1);
    }

    #[test]
    fn test_union_scopes_only_relative_branches() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let org = evaluate(&root, "Org[2]").unwrap().next().unwrap();
        let found: Vec<_> = evaluate(&org, "/D | E").unwrap().collect();
        assert_eq!(found.len(), 4);
        assert_eq!(found[0].name(), Some("D"));
        assert!(found[1..].iter().all(|c| c.name() == Some("E") && crate::is_within(&org, c)));
        assert_eq!(evaluate(&org, "E | /D").unwrap().count(), 4);
        assert_eq!(evaluate(&org, "//Name | /D/Org[1]").unwrap().count(), 2);
        assert_eq!(evaluate(&org, "(.. | /D/Org)[1]").unwrap().next().unwrap().attribute_text("id"), Some("1".to_string()));
    }

    #[test]
    fn test_scope_includes_context_and_its_attributes() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let org = evaluate(&root, "Org[@id = '2']").unwrap().next().unwrap();
        assert_eq!(evaluate(&org, ".").unwrap().next(), Some(org.clone()));
        let ids: Vec<_> = evaluate(&org, "//@id").unwrap().collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].attribute_text("id"), Some("2".to_string()));
        assert_eq!(evaluate(&org, "//Org").unwrap().count(), 1);
    }

    #[test]
    fn test_attribute_matches() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let ids: Vec<_> = evaluate(&root, "Org/@id").unwrap().collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].classify(), crate::NodeKind::Attribute);
        assert_eq!(ids[0].name(), Some("id"));
        assert_eq!(ids[1].text_at("Org/@id").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_positional_predicates() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        assert_eq!(evaluate(&root, "//E[1]").unwrap().count(), 2);
        assert_eq!(evaluate(&root, "(//E)[1]").unwrap().count(), 1);
        assert_eq!(evaluate(&root, "//E[last()]").unwrap().count(), 2);
        assert_eq!(evaluate(&root, "Org[2]/E[position() > 1]").unwrap().count(), 2);
        assert_eq!(evaluate(&root, "//E[Name]").unwrap().count(), 2);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        assert_eq!(evaluate(&root, "/nonexistent").unwrap().count(), 0);
        assert_eq!(evaluate(&root, "//Missing[1]").unwrap().count(), 0);
    }

    #[test]
    fn test_syntax_errors() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        for expr in ["//E[", "following::E", "1 +", "count(E)", "E]", "//E[bogus()]"] {
            assert!(
                matches!(evaluate(&root, expr), Err(Error::PathSyntax { .. })),
                "{expr} should be rejected"
            );
        }
    }

    #[test]
    fn test_namespace_bindings() {
        let xml = r#"<r xmlns:a="urn:a" xmlns:b="urn:b"><a:x/><b:x/><x/></r>"#;
        let aware = Document::parse(xml, true).unwrap().root_cursor();
        let unaware = Document::parse(xml, false).unwrap().root_cursor();

        assert!(matches!(
            evaluate(&aware, "//q:x"),
            Err(Error::UnboundNamespacePrefix { .. })
        ));

        let ns = Namespaces::new().with("q", "urn:b");
        let found: Vec<_> = evaluate_with(&aware, "//q:x", &ns).unwrap().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), Some("b:x"));

        // Without namespace processing the prefix text itself must match
        assert_eq!(evaluate_with(&unaware, "//q:x", &ns).unwrap().count(), 0);
        let ns = Namespaces::new().with("a", "urn:ignored");
        assert_eq!(evaluate_with(&unaware, "//a:x", &ns).unwrap().count(), 1);

        // Unprefixed tests compare the literal name
        assert_eq!(evaluate(&aware, "//x").unwrap().count(), 1);
        assert_eq!(evaluate_with(&aware, "//q:*", &Namespaces::new().with("q", "urn:a")).unwrap().count(), 1);
    }

    #[test]
    fn test_text_and_other_node_tests() {
        let doc = Document::parse("<r>a<!--c--><?p d?><![CDATA[b]]><e/></r>", false).unwrap();
        let root = doc.root_cursor();
        assert_eq!(evaluate(&root, "text()").unwrap().count(), 2);
        assert_eq!(evaluate(&root, "comment()").unwrap().count(), 1);
        assert_eq!(evaluate(&root, "processing-instruction('p')").unwrap().count(), 1);
        assert_eq!(evaluate(&root, "processing-instruction('q')").unwrap().count(), 0);
        assert_eq!(evaluate(&root, "node()").unwrap().count(), 5);
        assert_eq!(evaluate(&root, "*").unwrap().count(), 1);
    }

    #[test]
    fn test_restartable() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let first = offsets(evaluate(&root, "//E").unwrap());
        let second = offsets(evaluate(&root, "//E").unwrap());
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }
}
