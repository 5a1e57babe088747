//! Span - offset and length into original input
//!
//! Zero-copy reference to a portion of the input document.
//! Used for element names and extents, attribute names/values, and text content.

/// A span referencing a portion of the input document.
///
/// Size: 8 bytes (offset: 4 bytes, len: 4 bytes).
/// Documents are therefore limited to 4GB, which is well past what a
/// single in-memory buffer is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset into the original input
    pub offset: u32,
    /// Length in bytes
    pub len: u32,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Create a span from a `start..end` byte range
    #[inline]
    pub fn from_range(start: usize, end: usize) -> Self {
        Self::new(start as u32, end.saturating_sub(start) as u32)
    }

    /// Create an empty span (used for "no value")
    #[inline]
    pub const fn empty() -> Self {
        Self { offset: 0, len: 0 }
    }

    /// Get the end offset (exclusive)
    #[inline]
    pub const fn end(&self) -> u32 {
        self.offset.saturating_add(self.len)
    }

    /// Extract the byte slice from input
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let start = self.offset as usize;
        let end = start.saturating_add(self.len as usize);
        if end <= input.len() {
            &input[start..end]
        } else {
            &[]
        }
    }

    /// Extract as UTF-8 string from input
    #[inline]
    pub fn as_str<'a>(&self, input: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(self.slice(input)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic() {
        let span = Span::new(5, 10);
        assert_eq!(span.offset, 5);
        assert_eq!(span.len, 10);
        assert_eq!(span.end(), 15);
        assert_ne!(span.len, 0);
    }

    #[test]
    fn test_span_empty() {
        let span = Span::empty();
        assert_eq!(span.len, 0);
        assert_eq!(span.end(), 0);
    }

    #[test]
    fn test_span_slice() {
        let input = b"hello world";
        assert_eq!(Span::new(6, 5).slice(input), b"world");
        assert_eq!(Span::from_range(0, 5).as_str(input), Some("hello"));
    }

    #[test]
    fn test_span_out_of_bounds_is_empty() {
        let input = b"short";
        assert_eq!(Span::new(3, 10).slice(input), b"");
    }
}
