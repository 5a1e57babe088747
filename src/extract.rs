//! Text and attribute extraction
//!
//! All returned text is entity-decoded and then normalized. Absence (no such
//! attribute, no character data) is `None`; asking for the text of an element
//! that has child elements is a hard `MixedContent` error.

use crate::cursor::Cursor;
use crate::document::{NodeKind, Position};
use crate::error::{Error, Result};
use crate::xpath::{evaluate_with, Namespaces};

/// Trim leading and trailing whitespace and collapse interior runs to one space
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(is_xml_whitespace).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[inline]
fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Attribute name addressed by the last `@` step of an expression
fn attribute_name_in(expr: &str) -> Option<&str> {
    let (_, tail) = expr.rsplit_once('@')?;
    let tail = tail.trim_start();
    let end = tail
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
        .unwrap_or(tail.len());
    Some(&tail[..end]).filter(|name| !name.is_empty())
}

impl Cursor {
    /// Normalized value of the named attribute on the containing element
    pub fn attribute_text(&self, name: &str) -> Option<String> {
        let doc = self.document();
        let element = doc.containing_element(self.pos())?;
        doc.attributes(Position::Element(element))
            .find(|&attr| doc.name(attr) == Some(name))
            .map(|attr| normalize(&doc.string_value(attr)))
    }

    /// Normalized character data of the current element
    ///
    /// Text and CDATA children are concatenated in document order; comments
    /// and processing instructions are skipped. Returns `None` when there is
    /// no character data at all. Fails with `MixedContent` when the element
    /// has child elements. On a text-like position the node's own content is
    /// returned; an attribute position reads its owning element.
    pub fn element_text(&self) -> Result<Option<String>> {
        let doc = self.document();
        let element = match self.pos() {
            Position::Text(idx) => return Ok(Some(normalize(&doc.text_value(idx)))),
            Position::Document => return Err(self.mixed_content(None)),
            pos => match doc.containing_element(pos) {
                Some(element) => element,
                None => return Ok(None),
            },
        };

        if doc.element(element).is_some_and(|e| e.is_empty()) {
            return Ok(None);
        }
        if doc.index().first_child(element).is_some() {
            return Err(self.mixed_content(Some(element)));
        }

        let mut text: Option<String> = None;
        for idx in doc.index().text_children(element) {
            let is_character_data = doc.text_node(idx).is_some_and(|t| t.is_character_data());
            if is_character_data {
                text.get_or_insert_with(String::new).push_str(&doc.text_value(idx));
            }
        }
        Ok(text.map(|t| normalize(&t)))
    }

    /// Text addressed by a cursor that `expr` produced: the attribute named
    /// after the last `@` of `expr` for attribute positions, else the
    /// element text
    ///
    /// The name is taken from the expression text, not the matched node, so
    /// a union of different attributes such as `//@id | //@name` reads the
    /// last-named attribute for every match. Pass a single-attribute path,
    /// or use [`Cursor::attribute_text`] with [`Cursor::name`].
    pub fn text_at(&self, expr: &str) -> Result<Option<String>> {
        if self.classify() != NodeKind::Attribute {
            return self.element_text();
        }
        let name = match attribute_name_in(expr) {
            Some(name) => name,
            None => match self.name() {
                Some(name) => name,
                None => return Ok(None),
            },
        };
        Ok(self.attribute_text(name))
    }

    fn mixed_content(&self, element: Option<u32>) -> Error {
        let doc = self.document();
        let (name, span) = match element.and_then(|idx| doc.element(idx)) {
            Some(e) => (doc.span_str(e.name).to_string(), e.extent),
            None => ("#document".to_string(), doc.extent(Position::Document)),
        };
        tracing::debug!(
            target: "xmlnav::extract",
            name = %name,
            offset = span.offset,
            length = span.len,
            "element text requested on element with child elements"
        );
        Error::MixedContent {
            name,
            offset: span.offset as usize,
            length: span.len as usize,
            raw: doc.span_str(span).to_string(),
        }
    }
}

/// Evaluate `expr` and return the text of its first match
pub fn first_text(context: &Cursor, expr: &str, namespaces: &Namespaces) -> Result<Option<String>> {
    match evaluate_with(context, expr, namespaces)?.next() {
        Some(found) => found.text_at(expr),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::evaluate;
    use crate::Document;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  a   b  "), "a b");
        assert_eq!(normalize("\n\ta\r\nb\t"), "a b");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("x"), "x");
    }

    #[test]
    fn test_attribute_name_in() {
        assert_eq!(attribute_name_in("//E/@id"), Some("id"));
        assert_eq!(attribute_name_in("@x:lang"), Some("x:lang"));
        assert_eq!(attribute_name_in("//a[@k='v']/@name"), Some("name"));
        assert_eq!(attribute_name_in("//@*"), None);
        assert_eq!(attribute_name_in("//a"), None);
    }

    #[test]
    fn test_element_text() {
        let doc = Document::parse("<r><n> Alice &amp;\n Bob </n><m/><k><!--c--><![CDATA[a<b]]> x</k></r>", false).unwrap();
        let mut n = doc.root_cursor();
        assert!(n.to_first_child(Some("n")));
        assert_eq!(n.element_text().unwrap(), Some("Alice & Bob".to_string()));

        let mut m = doc.root_cursor();
        assert!(m.to_first_child(Some("m")));
        assert_eq!(m.element_text().unwrap(), None);

        let mut k = doc.root_cursor();
        assert!(k.to_first_child(Some("k")));
        assert_eq!(k.element_text().unwrap(), Some("a<b x".to_string()));
    }

    #[test]
    fn test_element_text_mixed_content() {
        let xml = "<r><o>text<e/></o></r>";
        let doc = Document::parse(xml, false).unwrap();
        let mut o = doc.root_cursor();
        assert!(o.to_first_child(None));
        match o.element_text() {
            Err(Error::MixedContent { name, offset, length, raw }) => {
                assert_eq!(name, "o");
                assert_eq!(offset, 3);
                assert_eq!(length, 15);
                assert_eq!(raw, "<o>text<e/></o>");
            }
            other => panic!("expected MixedContent, got {other:?}"),
        }
    }

    #[test]
    fn test_attribute_text() {
        let doc = Document::parse("<r a=\" x  y \" b=\"&lt;\"/>", false).unwrap();
        let root = doc.root_cursor();
        assert_eq!(root.attribute_text("a"), Some("x y".to_string()));
        assert_eq!(root.attribute_text("b"), Some("<".to_string()));
        assert_eq!(root.attribute_text("c"), None);
    }

    #[test]
    fn test_text_at_dispatch() {
        let doc = Document::parse("<r><e id=\"7\">seven</e></r>", false).unwrap();
        let root = doc.root_cursor();

        let attr = evaluate(&root, "e/@id").unwrap().next().unwrap();
        assert_eq!(attr.text_at("e/@id").unwrap(), Some("7".to_string()));

        let wildcard = evaluate(&root, "e/@*").unwrap().next().unwrap();
        assert_eq!(wildcard.text_at("e/@*").unwrap(), Some("7".to_string()));

        let elem = evaluate(&root, "e").unwrap().next().unwrap();
        assert_eq!(elem.text_at("e").unwrap(), Some("seven".to_string()));
    }

    #[test]
    fn test_text_at_names_attribute_from_expression() {
        let doc = Document::parse("<r><e id=\"7\" name=\"n\"/></r>", false).unwrap();
        let root = doc.root_cursor();
        let expr = "e/@id | e/@name";
        let matches: Vec<_> = evaluate(&root, expr).unwrap().collect();
        assert_eq!(matches[0].name(), Some("id"));
        assert_eq!(matches[0].text_at(expr).unwrap(), Some("n".to_string()));
        assert_eq!(matches[1].text_at(expr).unwrap(), Some("n".to_string()));

        let own = matches[0].name().and_then(|name| matches[0].attribute_text(name));
        assert_eq!(own, Some("7".to_string()));
    }

    #[test]
    fn test_first_text() {
        let doc = Document::parse("<r><e>one</e><e>two</e></r>", false).unwrap();
        let root = doc.root_cursor();
        let ns = Namespaces::new();
        assert_eq!(first_text(&root, "//e", &ns).unwrap(), Some("one".to_string()));
        assert_eq!(first_text(&root, "//missing", &ns).unwrap(), None);
    }

    #[test]
    fn test_text_position_returns_own_content() {
        let doc = Document::parse("<r>a <!-- b  c --></r>", false).unwrap();
        let root = doc.root_cursor();
        let comment = evaluate(&root, "comment()").unwrap().next().unwrap();
        assert_eq!(comment.element_text().unwrap(), Some("b c".to_string()));
    }
}
