//! Byte-level cursor for the markup scanner
//!
//! Delimiter searches go through memchr, which picks SSE2, AVX2 or NEON at
//! runtime. Positions are byte offsets into the input and never pass its
//! end.

use memchr::{memchr, memmem};

/// Read position over the input of one scan
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Jump to `pos`, clamped to the end of input
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at byte at offset from current position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advance by n bytes, clamped to the end of input
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Absolute offset of the next `<`, where character data ends
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        self.find_byte(b'<')
    }

    /// Absolute offset of the next `byte`, such as a closing quote
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Absolute offset of the next `needle`, such as `-->` or `]]>`
    #[inline]
    pub fn find_seq(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Consume an XML name and return its `(start, end)` range. Leaves the
    /// position untouched when no name starts here.
    pub fn read_name(&mut self) -> Option<(usize, usize)> {
        let start = self.pos;
        if !is_name_start_char(self.peek()?) {
            return None;
        }
        self.pos += 1;
        while self.pos < self.input.len() && is_name_char(self.input[self.pos]) {
            self.pos += 1;
        }
        Some((start, self.pos))
    }
}

/// Name start byte: ASCII letter, `_`, `:`, or any byte of a multi-byte
/// UTF-8 sequence
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Name byte after the first
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

/// XML `S` production
#[inline]
pub fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_searches_are_absolute() {
        let mut scanner = Scanner::new(b"ab <c d='x'>-->");
        assert_eq!(scanner.find_tag_start(), Some(3));
        scanner.set_position(9);
        assert_eq!(scanner.find_byte(b'\''), Some(10));
        assert_eq!(scanner.find_seq(b"-->"), Some(12));
        assert_eq!(scanner.find_seq(b"]]>"), None);
    }

    #[test]
    fn test_position_is_clamped() {
        let mut scanner = Scanner::new(b"<a/>");
        scanner.advance(10);
        assert_eq!(scanner.position(), 4);
        assert_eq!(scanner.peek(), None);
        scanner.set_position(99);
        assert_eq!(scanner.position(), 4);
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"x:item-2 rest");
        assert_eq!(scanner.read_name(), Some((0, 8)));
        assert_eq!(scanner.position(), 8);
        scanner.skip_whitespace();
        assert!(scanner.starts_with(b"rest"));
    }

    #[test]
    fn test_read_name_rejects_bad_start() {
        for input in [&b"1abc"[..], b"-a", b" a"] {
            let mut scanner = Scanner::new(input);
            assert_eq!(scanner.read_name(), None);
            assert_eq!(scanner.position(), 0);
        }
    }

    #[test]
    fn test_non_ascii_names() {
        let mut scanner = Scanner::new("名前>".as_bytes());
        assert_eq!(scanner.read_name(), Some((0, 6)));
        assert_eq!(scanner.peek_at(0), Some(b'>'));
    }
}
