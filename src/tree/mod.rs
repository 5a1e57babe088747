//! Fragment to tree conversion
//!
//! A matched element's raw markup is re-parsed into a [`TreeNode`]. Only
//! elements can be converted: attributes have no extent of their own, and
//! text-like nodes are not elements.

mod builder;
mod node;

pub use builder::parse_fragment;
pub use node::{TreeContent, TreeNode};

use crate::cursor::Cursor;
use crate::document::NodeKind;
use crate::error::{Error, Result};

impl Cursor {
    /// Literal markup of the element containing the current position,
    /// sliced from the document without copying
    pub fn raw_xml_text(&self) -> &str {
        let fragment = self.fragment();
        self.document().as_str().get(fragment.range()).unwrap_or_default()
    }

    /// Convert the element at the current position into a [`TreeNode`]
    pub fn to_tree(&self) -> Result<TreeNode> {
        match self.classify() {
            NodeKind::Element => parse_fragment(self.raw_xml_text().as_bytes()),
            NodeKind::Attribute => Err(Error::FragmentParse(
                "attributes have no extent of their own".to_string(),
            )),
            kind => Err(Error::FragmentParse(format!("cannot convert a {kind:?} node to a tree"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    const XML: &str = "<D><Org id=\"1\"><E><Name>Alice</Name></E></Org><!--c-->text</D>";

    #[test]
    fn test_raw_xml_text() {
        let doc = Document::parse(XML, false).unwrap();
        let mut cursor = doc.root_cursor();
        assert_eq!(cursor.raw_xml_text(), XML);
        assert!(cursor.to_first_child(Some("Org")));
        assert_eq!(cursor.raw_xml_text(), "<Org id=\"1\"><E><Name>Alice</Name></E></Org>");
    }

    #[test]
    fn test_to_tree() {
        let doc = Document::parse(XML, false).unwrap();
        let mut cursor = doc.root_cursor();
        assert!(cursor.to_first_child(Some("Org")));
        let tree = cursor.to_tree().unwrap();
        assert_eq!(tree.tag, "Org");
        assert_eq!(tree.attr("id"), Some("1"));
        let e = tree.children().next().unwrap();
        assert_eq!(e.children().next().unwrap().text(), "Alice");
    }

    #[test]
    fn test_non_elements_rejected() {
        let doc = Document::parse(XML, false).unwrap();
        let root = doc.root_cursor();

        let attr = crate::evaluate(&root, "Org/@id").unwrap().next().unwrap();
        assert_eq!(attr.raw_xml_text(), "<Org id=\"1\"><E><Name>Alice</Name></E></Org>");
        assert_eq!(
            attr.to_tree(),
            Err(Error::FragmentParse("attributes have no extent of their own".into()))
        );

        let comment = crate::evaluate(&root, "comment()").unwrap().next().unwrap();
        assert!(matches!(comment.to_tree(), Err(Error::FragmentParse(_))));
        let text = crate::evaluate(&root, "text()").unwrap().next().unwrap();
        assert!(matches!(text.to_tree(), Err(Error::FragmentParse(_))));
    }
}
