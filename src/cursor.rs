//! Cursor: a movable, cloneable position in a [`Document`]
//!
//! Movement mutates only the cursor's own position. A failed move returns
//! `false` and leaves the position unchanged. Cloning copies the position
//! and shares the document, so a clone can be moved (or sent to another
//! thread) without affecting the original.
//!
//! Name filters compare the literal tag text, prefix included, regardless of
//! whether the document was parsed namespace-aware.
//!
//! A cursor on an attribute or text-like node moves as if it were on the
//! containing element, the same element [`Cursor::fragment`] reports.

use crate::containment::Fragment;
use crate::document::{Document, NodeKind, Position};

/// Position into a parsed document
#[derive(Clone)]
pub struct Cursor {
    doc: Document,
    pos: Position,
}

impl Cursor {
    pub(crate) fn new(doc: Document, pos: Position) -> Self {
        Self { doc, pos }
    }

    #[inline]
    pub(crate) fn pos(&self) -> Position {
        self.pos
    }

    /// The document this cursor navigates
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Element the movement operations start from; `None` for the document
    /// node and top-level comments or processing instructions
    fn anchor(&self) -> Option<u32> {
        self.doc.containing_element(self.pos)
    }

    fn name_matches(&self, idx: u32, name: Option<&str>) -> bool {
        match name {
            None => true,
            Some(name) => self.doc.name(Position::Element(idx)) == Some(name),
        }
    }

    /// Move to the enclosing element. Returns false at the root element.
    pub fn to_parent(&mut self) -> bool {
        let index = self.doc.index();
        match self.anchor().and_then(|idx| index.parent(idx)) {
            Some(parent) => {
                self.pos = Position::Element(parent);
                true
            }
            None => false,
        }
    }

    /// Move to the first child element, optionally the first with `name`
    pub fn to_first_child(&mut self, name: Option<&str>) -> bool {
        let found = match self.anchor() {
            Some(idx) => self
                .doc
                .index()
                .element_children(idx)
                .find(|&child| self.name_matches(child, name)),
            None => self.top_level_element(name),
        };
        self.move_to(found)
    }

    /// Move to the last child element, optionally the last with `name`
    pub fn to_last_child(&mut self, name: Option<&str>) -> bool {
        let index = self.doc.index();
        let found = match self.anchor() {
            Some(idx) => {
                let mut child = index.last_child(idx);
                while let Some(c) = child {
                    if self.name_matches(c, name) {
                        break;
                    }
                    child = index.prev_sibling(c);
                }
                child
            }
            None => self.top_level_element(name),
        };
        self.move_to(found)
    }

    /// Move to the next sibling element, optionally the next with `name`
    pub fn to_next_sibling(&mut self, name: Option<&str>) -> bool {
        let index = self.doc.index();
        let mut next = self.anchor().and_then(|idx| index.next_sibling(idx));
        while let Some(idx) = next {
            if self.name_matches(idx, name) {
                break;
            }
            next = index.next_sibling(idx);
        }
        self.move_to(next)
    }

    /// Move to the previous sibling element, optionally the previous with `name`
    pub fn to_prev_sibling(&mut self, name: Option<&str>) -> bool {
        let index = self.doc.index();
        let mut prev = self.anchor().and_then(|idx| index.prev_sibling(idx));
        while let Some(idx) = prev {
            if self.name_matches(idx, name) {
                break;
            }
            prev = index.prev_sibling(idx);
        }
        self.move_to(prev)
    }

    /// From outside the root element the only child element is the root
    fn top_level_element(&self, name: Option<&str>) -> Option<u32> {
        self.doc
            .index()
            .root
            .filter(|&root| self.name_matches(root, name))
    }

    fn move_to(&mut self, target: Option<u32>) -> bool {
        match target {
            Some(idx) => {
                self.pos = Position::Element(idx);
                true
            }
            None => false,
        }
    }

    /// Kind of node at the current position
    pub fn classify(&self) -> NodeKind {
        self.doc.kind(self.pos)
    }

    /// Literal name (prefix included) of an element, attribute or PI target
    pub fn name(&self) -> Option<&str> {
        self.doc.name(self.pos)
    }

    /// Resolved namespace URI of an element or attribute in a
    /// namespace-aware document
    pub fn namespace_uri(&self) -> Option<&str> {
        self.doc.namespace_uri(self.pos)
    }

    /// Byte extent of the element containing the current position. For an
    /// attribute this is the owning element's extent; for the document node
    /// (and top-level comments or PIs) it is the whole input.
    pub fn fragment(&self) -> Fragment {
        let span = self.doc.extent(self.pos);
        Fragment::new(span.offset as usize, span.len as usize)
    }

    /// Number of element ancestors; the root element is at depth 0
    pub fn depth(&self) -> usize {
        self.doc.depth(self.pos)
    }

    /// Raw `(name, value)` attribute pairs of the containing element
    pub fn attributes(&self) -> Vec<(&str, &str)> {
        let Some(idx) = self.anchor() else {
            return Vec::new();
        };
        self.doc
            .index()
            .element_attributes(idx)
            .iter()
            .map(|attr| (self.doc.span_str(attr.name), self.doc.span_str(attr.value)))
            .collect()
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.doc.same_document(&other.doc)
    }
}

impl Eq for Cursor {}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("kind", &self.classify())
            .field("name", &self.name())
            .field("fragment", &self.fragment())
            .finish()
    }
}
