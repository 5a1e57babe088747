//! XPath Axes Implementation
//!
//! Supported axes:
//! - child, parent, self
//! - descendant, descendant-or-self
//! - ancestor, ancestor-or-self
//! - following-sibling, preceding-sibling
//! - attribute
//!
//! Results are in axis order: document order for forward axes, nearest
//! first for reverse axes.

use super::parser::Axis;
use crate::document::{Document, Position};

/// Navigate along an axis from a context node
pub(crate) fn navigate(doc: &Document, context: Position, axis: Axis) -> Vec<Position> {
    match axis {
        Axis::Child => doc.children(context).collect(),
        Axis::Descendant => Walk::descendants(doc, context).collect_all(doc),
        Axis::DescendantOrSelf => Walk::descendants_or_self(context).collect_all(doc),
        Axis::Parent => doc.parent(context).into_iter().collect(),
        Axis::Ancestor => ancestors(doc, context),
        Axis::AncestorOrSelf => {
            let mut result = vec![context];
            result.extend(ancestors(doc, context));
            result
        }
        Axis::FollowingSibling => doc.siblings(context, true),
        Axis::PrecedingSibling => doc.siblings(context, false),
        Axis::Self_ => vec![context],
        Axis::Attribute => doc.attributes(context).collect(),
    }
}

/// Parent, grandparent, ... up to and including the document node
pub(crate) fn ancestors(doc: &Document, context: Position) -> Vec<Position> {
    let mut result = Vec::new();
    let mut current = context;
    while let Some(parent) = doc.parent(current) {
        result.push(parent);
        current = parent;
    }
    result
}

/// Resumable axis traversal that holds positions only, so it can live
/// next to the document handle it walks
#[derive(Debug)]
pub(crate) enum Walk {
    /// Pre-order traversal; the next node is on top of the stack
    Tree(Vec<Position>),
    List(std::vec::IntoIter<Position>),
}

impl Walk {
    /// Walk for a forward axis, lazy for the descendant axes
    pub fn new(doc: &Document, context: Position, axis: Axis) -> Self {
        match axis {
            Axis::Descendant => Walk::descendants(doc, context),
            Axis::DescendantOrSelf => Walk::descendants_or_self(context),
            _ => Walk::List(navigate(doc, context, axis).into_iter()),
        }
    }

    pub fn descendants(doc: &Document, context: Position) -> Self {
        Walk::Tree(doc.children(context).rev().collect())
    }

    pub fn descendants_or_self(context: Position) -> Self {
        Walk::Tree(vec![context])
    }

    pub fn next(&mut self, doc: &Document) -> Option<Position> {
        match self {
            Walk::Tree(stack) => {
                let pos = stack.pop()?;
                stack.extend(doc.children(pos).rev());
                Some(pos)
            }
            Walk::List(iter) => iter.next(),
        }
    }

    pub fn collect_all(mut self, doc: &Document) -> Vec<Position> {
        let mut result = Vec::new();
        while let Some(pos) = self.next(doc) {
            result.push(pos);
        }
        result
    }
}
