//! Parsed document handle
//!
//! A [`Document`] owns the input text and its structural index behind an
//! `Arc`. It is never mutated after parsing; every [`Cursor`] holds a clone
//! of the handle, so the document lives as long as its last cursor.
//!
//! Node positions are opaque to callers. Internally a position is one of the
//! virtual document node, an element, an attribute of an element, or a
//! text-like node (text, CDATA, comment, processing instruction).

use std::borrow::Cow;
use std::sync::Arc;

use crate::config::ParseOptions;
use crate::core::entities::decode_text;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::index::builder::build_index;
use crate::index::element::{ChildRef, IndexAttribute, IndexElement, IndexText, NO_NODE};
use crate::index::{Span, StructuralIndex};

/// Kind of node a cursor addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
    Comment,
    /// A processing instruction, addressed through its target name
    ProcessingInstructionName,
    /// Reserved: the index never addresses PI data on its own
    ProcessingInstructionValue,
    CData,
    Document,
    Other,
}

/// Position of a cursor within the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Position {
    Document,
    Element(u32),
    /// `attr` indexes the document-wide attribute array
    Attribute { element: u32, attr: u32 },
    Text(u32),
}

/// Sort key that orders positions by document order
pub(crate) type OrderKey = (u32, u32);

/// Immutable parsed XML document, cheap to clone and shareable across threads
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

struct DocumentInner {
    text: Box<str>,
    index: StructuralIndex,
    namespace_aware: bool,
}

impl Document {
    /// Parse a document, failing with `MalformedDocument` when the input is
    /// not well-formed UTF-8 XML
    pub fn parse(bytes: impl Into<Vec<u8>>, namespace_aware: bool) -> Result<Document> {
        Self::parse_with(bytes, &ParseOptions::new().namespace_aware(namespace_aware))
    }

    /// Parse a document with explicit options
    pub fn parse_with(bytes: impl Into<Vec<u8>>, options: &ParseOptions) -> Result<Document> {
        let text = String::from_utf8(bytes.into()).map_err(|err| Error::MalformedDocument {
            offset: err.utf8_error().valid_up_to(),
            message: "invalid UTF-8".to_string(),
        })?;
        if text.len() > u32::MAX as usize {
            return Err(Error::MalformedDocument {
                offset: u32::MAX as usize,
                message: "document exceeds 4 GiB".to_string(),
            });
        }
        let index = build_index(text.as_bytes(), options.namespace_aware)?;
        Ok(Document {
            inner: Arc::new(DocumentInner {
                text: text.into_boxed_str(),
                index,
                namespace_aware: options.namespace_aware,
            }),
        })
    }

    /// A cursor positioned on the root element
    pub fn root_cursor(&self) -> Cursor {
        let pos = self.root_element().unwrap_or(Position::Document);
        Cursor::new(self.clone(), pos)
    }

    /// A cursor on the element whose start tag begins at `offset`
    pub fn element_at(&self, offset: usize) -> Option<Cursor> {
        let offset = u32::try_from(offset).ok()?;
        let idx = self.index().element_starting_at(offset)?;
        Some(Cursor::new(self.clone(), Position::Element(idx)))
    }

    /// The original input
    pub fn bytes(&self) -> &[u8] {
        self.inner.text.as_bytes()
    }

    /// The original input as text (validated UTF-8)
    pub fn as_str(&self) -> &str {
        &self.inner.text
    }

    pub fn len(&self) -> usize {
        self.inner.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.text.is_empty()
    }

    pub fn is_namespace_aware(&self) -> bool {
        self.inner.namespace_aware
    }

    pub fn element_count(&self) -> usize {
        self.index().element_count()
    }

    /// Every `(prefix, uri)` namespace declaration in document order; the
    /// default namespace has prefix `""`. Empty unless namespace-aware.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.index().namespaces.declarations()
    }

    pub(crate) fn same_document(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[inline]
    pub(crate) fn index(&self) -> &StructuralIndex {
        &self.inner.index
    }

    /// Slice the input text; spans always start and end on ASCII markup
    /// boundaries or on boundaries the scanner found inside valid UTF-8
    #[inline]
    pub(crate) fn span_str(&self, span: Span) -> &str {
        let start = span.offset as usize;
        let end = span.end() as usize;
        self.inner.text.get(start..end).unwrap_or("")
    }

    #[inline]
    pub(crate) fn element(&self, idx: u32) -> Option<&IndexElement> {
        self.index().get_element(idx)
    }

    #[inline]
    pub(crate) fn text_node(&self, idx: u32) -> Option<&IndexText> {
        self.index().get_text(idx)
    }

    #[inline]
    pub(crate) fn attribute(&self, idx: u32) -> Option<&IndexAttribute> {
        self.index().attributes.get(idx as usize)
    }

    // === Node access by position ===

    pub(crate) fn kind(&self, pos: Position) -> NodeKind {
        match pos {
            Position::Document => NodeKind::Document,
            Position::Element(_) => NodeKind::Element,
            Position::Attribute { .. } => NodeKind::Attribute,
            Position::Text(idx) => match self.text_node(idx) {
                Some(t) if t.is_cdata() => NodeKind::CData,
                Some(t) if t.is_comment() => NodeKind::Comment,
                Some(t) if t.is_pi() => NodeKind::ProcessingInstructionName,
                Some(_) => NodeKind::Text,
                None => NodeKind::Other,
            },
        }
    }

    /// Literal qualified name: element, attribute, or PI target
    pub(crate) fn name(&self, pos: Position) -> Option<&str> {
        match pos {
            Position::Element(idx) => Some(self.span_str(self.element(idx)?.name)),
            Position::Attribute { attr, .. } => Some(self.span_str(self.attribute(attr)?.name)),
            Position::Text(idx) => {
                let text = self.text_node(idx)?;
                text.is_pi().then(|| self.span_str(text.span))
            }
            Position::Document => None,
        }
    }

    /// Resolved namespace URI of an element or attribute position
    pub(crate) fn namespace_uri(&self, pos: Position) -> Option<&str> {
        let id = match pos {
            Position::Element(idx) => self.element(idx)?.namespace,
            Position::Attribute { attr, .. } => self.attribute(attr)?.namespace,
            _ => return None,
        };
        self.index().namespaces.uri(id)
    }

    /// The element that contains a position: itself, the owner of an
    /// attribute, or the parent of a text-like node
    pub(crate) fn containing_element(&self, pos: Position) -> Option<u32> {
        match pos {
            Position::Document => None,
            Position::Element(idx) => Some(idx),
            Position::Attribute { element, .. } => Some(element),
            Position::Text(idx) => {
                let parent = self.text_node(idx)?.parent;
                (parent != NO_NODE).then_some(parent)
            }
        }
    }

    /// Byte extent reported for a position: the containing element, or the
    /// whole input when there is none
    pub(crate) fn extent(&self, pos: Position) -> Span {
        self.containing_element(pos)
            .and_then(|idx| self.element(idx))
            .map(|e| e.extent)
            .unwrap_or_else(|| Span::new(0, self.len() as u32))
    }

    /// Number of element ancestors (the root element has depth 0)
    pub(crate) fn depth(&self, pos: Position) -> usize {
        match pos {
            Position::Element(idx) => self.element(idx).map_or(0, |e| e.depth as usize),
            _ => match self.containing_element(pos) {
                Some(parent) => self.depth(Position::Element(parent)) + 1,
                None => 0,
            },
        }
    }

    pub(crate) fn order_key(&self, pos: Position) -> OrderKey {
        match pos {
            Position::Document => (0, 0),
            Position::Element(idx) => (self.element(idx).map_or(0, |e| e.extent.offset), 2),
            Position::Attribute { element, attr } => {
                let elem = self.element(element);
                let start = elem.map_or(0, |e| e.attr_start);
                (elem.map_or(0, |e| e.extent.offset), 3 + attr.saturating_sub(start))
            }
            // Never (0, 0), which belongs to the document node
            Position::Text(idx) => (self.text_node(idx).map_or(0, |t| t.span.offset), 1),
        }
    }

    // === Tree navigation used by the XPath axes ===

    pub(crate) fn root_element(&self) -> Option<Position> {
        self.index().root.map(Position::Element)
    }

    /// XPath parent: the document node is the parent of top-level nodes
    pub(crate) fn parent(&self, pos: Position) -> Option<Position> {
        match pos {
            Position::Document => None,
            Position::Element(idx) => Some(
                self.index()
                    .parent(idx)
                    .map_or(Position::Document, Position::Element),
            ),
            Position::Attribute { element, .. } => Some(Position::Element(element)),
            Position::Text(idx) => {
                let parent = self.text_node(idx)?.parent;
                Some(if parent == NO_NODE {
                    Position::Document
                } else {
                    Position::Element(parent)
                })
            }
        }
    }

    /// Children (elements and text-like nodes) in document order
    pub(crate) fn children(&self, pos: Position) -> impl DoubleEndedIterator<Item = Position> + '_ {
        let iter = match pos {
            Position::Document => Some(self.index().top_level()),
            Position::Element(idx) => Some(self.index().children(idx)),
            _ => None,
        };
        iter.into_iter().flatten().map(child_position)
    }

    /// Attribute positions of an element in document order
    pub(crate) fn attributes(&self, pos: Position) -> impl DoubleEndedIterator<Item = Position> + '_ {
        let (element, range) = match pos {
            Position::Element(idx) => match self.element(idx) {
                Some(e) => (idx, e.attr_start..e.attr_start + e.attr_count),
                None => (0, 0..0),
            },
            _ => (0, 0..0),
        };
        range.map(move |attr| Position::Attribute { element, attr })
    }

    /// Siblings after (`forward`) or before a node, nearest first
    pub(crate) fn siblings(&self, pos: Position, forward: bool) -> Vec<Position> {
        let Some(parent) = self.parent(pos) else {
            return Vec::new();
        };
        if matches!(pos, Position::Attribute { .. } | Position::Document) {
            return Vec::new();
        }
        let all: Vec<Position> = self.children(parent).collect();
        let key = self.order_key(pos);
        match all.binary_search_by_key(&key, |p| self.order_key(*p)) {
            Ok(i) if forward => all[i + 1..].to_vec(),
            Ok(i) => all[..i].iter().rev().copied().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Whether `pos` is `ancestor` or lies inside its subtree
    pub(crate) fn is_in_subtree(&self, ancestor: Position, pos: Position) -> bool {
        match ancestor {
            Position::Document => true,
            Position::Element(idx) => {
                let Some(extent) = self.element(idx).map(|e| e.extent) else {
                    return false;
                };
                let (offset, _) = self.order_key(pos);
                pos != Position::Document && offset >= extent.offset && offset < extent.end()
            }
            other => other == pos,
        }
    }

    // === String values ===

    /// Decoded content of a text-like node: character data for text and
    /// CDATA, content for comments, data for processing instructions
    pub(crate) fn text_value(&self, idx: u32) -> Cow<'_, str> {
        match self.text_node(idx) {
            Some(t) if t.is_pi() => Cow::Borrowed(self.span_str(t.data)),
            Some(t) if t.needs_decode() => decode_text(self.span_str(t.span)),
            Some(t) => Cow::Borrowed(self.span_str(t.span)),
            None => Cow::Borrowed(""),
        }
    }

    /// Decoded attribute value
    pub(crate) fn attribute_value(&self, attr: u32) -> Cow<'_, str> {
        match self.attribute(attr) {
            Some(a) => decode_text(self.span_str(a.value)),
            None => Cow::Borrowed(""),
        }
    }

    /// XPath string-value of a node
    pub(crate) fn string_value(&self, pos: Position) -> String {
        match pos {
            Position::Attribute { attr, .. } => self.attribute_value(attr).into_owned(),
            Position::Text(idx) => self.text_value(idx).into_owned(),
            Position::Element(idx) => self.element_string_value(idx),
            Position::Document => self
                .index()
                .root
                .map(|root| self.element_string_value(root))
                .unwrap_or_default(),
        }
    }

    /// Concatenated character data of all descendants
    fn element_string_value(&self, idx: u32) -> String {
        let mut out = String::new();
        for child in self.index().descendants(idx) {
            if !child.is_text() {
                continue;
            }
            if let Some(text) = self.text_node(child.index()) {
                if text.is_character_data() {
                    out.push_str(&self.text_value(child.index()));
                }
            }
        }
        out
    }
}

#[inline]
fn child_position(child: ChildRef) -> Position {
    if child.is_text() {
        Position::Text(child.index())
    } else {
        Position::Element(child.index())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.len())
            .field("elements", &self.element_count())
            .field("namespace_aware", &self.is_namespace_aware())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = "<!--c--><r a=\"1\" b=\"x &amp; y\">one<e>two</e><![CDATA[<3>]]><?pi data?></r>";

    fn doc() -> Document {
        Document::parse(XML, false).unwrap()
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let err = Document::parse(&b"<a>\xff</a>"[..], false).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedDocument {
                offset: 3,
                message: "invalid UTF-8".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            Document::parse("<a><b></a>", false),
            Err(Error::MalformedDocument { offset: 6, .. })
        ));
    }

    #[test]
    fn test_document_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Document>();
    }

    #[test]
    fn test_kinds_and_names() {
        let doc = doc();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.name(root), Some("r"));
        let kinds: Vec<NodeKind> = doc.children(root).map(|p| doc.kind(p)).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Text,
                NodeKind::Element,
                NodeKind::CData,
                NodeKind::ProcessingInstructionName
            ]
        );
        let top: Vec<NodeKind> = doc.children(Position::Document).map(|p| doc.kind(p)).collect();
        assert_eq!(top, vec![NodeKind::Comment, NodeKind::Element]);
    }

    #[test]
    fn test_order_keys_follow_document_order() {
        let doc = doc();
        let root = doc.root_element().unwrap();
        let mut positions = vec![Position::Document, root];
        positions.extend(doc.attributes(root));
        positions.extend(doc.children(root));
        let keys: Vec<OrderKey> = positions.iter().map(|p| doc.order_key(*p)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_string_values() {
        let doc = doc();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.string_value(root), "onetwo<3>");
        let b = doc.attributes(root).nth(1).unwrap();
        assert_eq!(doc.string_value(b), "x & y");
        let pi = doc.children(root).last().unwrap();
        assert_eq!(doc.string_value(pi), "data");
        assert_eq!(doc.name(pi), Some("pi"));
    }

    #[test]
    fn test_siblings() {
        let doc = doc();
        let root = doc.root_element().unwrap();
        let e = doc.children(root).nth(1).unwrap();
        assert_eq!(doc.siblings(e, true).len(), 2);
        assert_eq!(doc.siblings(e, false).len(), 1);
        assert!(doc.siblings(root, true).is_empty());
    }

    #[test]
    fn test_extent_of_attribute_is_owner() {
        let doc = doc();
        let root = doc.root_element().unwrap();
        let a = doc.attributes(root).next().unwrap();
        assert_eq!(doc.extent(a), doc.extent(root));
        assert_eq!(doc.extent(Position::Document), Span::new(0, XML.len() as u32));
    }

    #[test]
    fn test_element_at() {
        let doc = doc();
        let cursor = doc.element_at(XML.find("<e>").unwrap()).unwrap();
        assert_eq!(cursor.name(), Some("e"));
        assert!(doc.element_at(1).is_none());
    }
}
