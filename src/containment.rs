//! Containment arithmetic over byte offsets
//!
//! Ancestor/descendant questions are answered by comparing element extents
//! instead of walking the index. An attribute has no extent of its own: its
//! fragment is the owning element's, so an attribute is never "within" the
//! element that carries it.

use crate::cursor::Cursor;

/// Half-open byte range `[offset, offset + length)` of a node's markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fragment {
    pub offset: usize,
    pub length: usize,
}

impl Fragment {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Whether `offset` lies strictly between the start and the end
    #[inline]
    pub fn strictly_contains(&self, offset: usize) -> bool {
        self.offset < offset && offset < self.end()
    }

    /// Byte range for slicing
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.end()
    }
}

/// The fragment of the element containing the cursor position
pub fn position(cursor: &Cursor) -> Fragment {
    cursor.fragment()
}

/// Whether `inner` starts strictly inside `outer`'s extent. A node is not
/// within itself.
pub fn is_within(outer: &Cursor, inner: &Cursor) -> bool {
    outer.fragment().strictly_contains(inner.fragment().offset)
}

/// Whether the cursor's start offset lies strictly between `start` and `end`
pub fn is_within_range(cursor: &Cursor, start: usize, end: usize) -> bool {
    let offset = cursor.fragment().offset;
    start < offset && offset < end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn test_fragment_bounds() {
        let frag = Fragment::new(10, 5);
        assert_eq!(frag.end(), 15);
        assert!(!frag.strictly_contains(10));
        assert!(frag.strictly_contains(11));
        assert!(frag.strictly_contains(14));
        assert!(!frag.strictly_contains(15));
    }

    #[test]
    fn test_is_within() {
        let doc = Document::parse("<a><b><c/></b><d/></a>", false).unwrap();
        let a = doc.root_cursor();
        let mut b = a.clone();
        assert!(b.to_first_child(None));
        let mut c = b.clone();
        assert!(c.to_first_child(None));
        let mut d = b.clone();
        assert!(d.to_next_sibling(None));

        assert!(is_within(&a, &b));
        assert!(is_within(&a, &c));
        assert!(is_within(&b, &c));
        assert!(!is_within(&b, &d));
        assert!(!is_within(&c, &b));
        assert!(!is_within(&a, &a));
    }

    #[test]
    fn test_is_within_range() {
        let doc = Document::parse("<a><b/></a>", false).unwrap();
        let mut b = doc.root_cursor();
        assert!(b.to_first_child(Some("b")));
        assert_eq!(position(&b), Fragment::new(3, 4));
        assert!(is_within_range(&b, 0, 11));
        assert!(!is_within_range(&b, 3, 11));
        assert!(!is_within_range(&b, 0, 3));
    }
}
