//! Unified Scanner with ScanHandler Trait
//!
//! Provides a trait-based interface for XML scanning that serves both:
//! - Index building (for cursor navigation and XPath queries)
//! - Fragment tree building (for `to_tree` conversion)
//!
//! The scanner uses the memchr-based Scanner for byte searching and reports
//! byte spans only. Malformed markup stops the scan with a [`ScanError`];
//! handlers may also stop it by returning one.

use super::scanner::{is_name_start_char, is_xml_whitespace, Scanner};
use crate::index::Span;

/// A well-formedness violation at a byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub offset: usize,
    pub message: String,
}

impl ScanError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

pub type ScanResult = Result<(), ScanError>;

/// Trait for handling scan events
///
/// Implement this trait to receive XML parsing events. The scanner calls
/// these methods as it tokenizes the input, passing spans (byte offsets)
/// instead of string copies for zero-copy efficiency.
pub trait ScanHandler {
    /// Called when an element starts
    ///
    /// # Arguments
    /// * `name` - Span of the element name in the input
    /// * `tag` - Span of the whole start tag, `<` through `>`
    /// * `attrs` - Slice of (name_span, value_span) pairs
    /// * `is_empty` - True if this is a self-closing element (e.g., `<br/>`)
    fn start_element(
        &mut self,
        name: Span,
        tag: Span,
        attrs: &[(Span, Span)],
        is_empty: bool,
    ) -> ScanResult;

    /// Called when an element ends
    ///
    /// # Arguments
    /// * `name` - Span of the element name in the input
    /// * `tag` - Span of the whole end tag, `</` through `>`
    fn end_element(&mut self, name: Span, tag: Span) -> ScanResult;

    /// Called for text content
    ///
    /// # Arguments
    /// * `span` - Span of the text in the input
    /// * `needs_entity_decode` - True if the text contains entity references
    fn text(&mut self, span: Span, needs_entity_decode: bool) -> ScanResult;

    /// Called for CDATA sections
    ///
    /// # Arguments
    /// * `span` - Span of the CDATA content (excluding `<![CDATA[` and `]]>`)
    fn cdata(&mut self, span: Span) -> ScanResult;

    /// Called for comments
    ///
    /// # Arguments
    /// * `span` - Span of the comment content (excluding `<!--` and `-->`)
    fn comment(&mut self, span: Span) -> ScanResult;

    /// Called for processing instructions
    ///
    /// # Arguments
    /// * `target` - Span of the PI target
    /// * `data` - Optional span of the PI data
    fn processing_instruction(&mut self, target: Span, data: Option<Span>) -> ScanResult;

    /// Called for the XML declaration (optional, default does nothing)
    fn xml_declaration(&mut self, _content: Option<Span>) -> ScanResult {
        Ok(())
    }

    /// Called for DOCTYPE (optional, default does nothing)
    fn doctype(&mut self, _content: Span) -> ScanResult {
        Ok(())
    }
}

/// Unified scanner that uses ScanHandler for event dispatch
pub struct UnifiedScanner<'a> {
    input: &'a [u8],
    scanner: Scanner<'a>,
    /// Reusable attribute buffer to avoid per-element allocations
    attrs_buf: Vec<(Span, Span)>,
}

impl<'a> UnifiedScanner<'a> {
    /// Create a new unified scanner for the input
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            scanner: Scanner::new(input),
            attrs_buf: Vec::with_capacity(8), // Most elements have < 8 attrs
        }
    }

    /// Scan the entire input, calling handler methods for each token
    pub fn scan<H: ScanHandler>(&mut self, handler: &mut H) -> ScanResult {
        while let Some(b) = self.scanner.peek() {
            if b == b'<' {
                self.scan_markup(handler)?;
            } else {
                self.scan_text(handler)?;
            }
        }
        Ok(())
    }

    /// Scan markup starting with '<'
    fn scan_markup<H: ScanHandler>(&mut self, handler: &mut H) -> ScanResult {
        let start = self.scanner.position();
        self.scanner.advance(1); // Skip '<'

        match self.scanner.peek() {
            Some(b'/') => {
                self.scanner.advance(1);
                self.scan_end_tag(start, handler)
            }
            Some(b'!') => {
                self.scanner.advance(1);
                if self.scanner.starts_with(b"--") {
                    self.scanner.advance(2);
                    self.scan_comment(start, handler)
                } else if self.scanner.starts_with(b"[CDATA[") {
                    self.scanner.advance(7);
                    self.scan_cdata(start, handler)
                } else if self.scanner.starts_with(b"DOCTYPE") {
                    self.scan_doctype(start, handler)
                } else {
                    Err(ScanError::new(start, "unrecognized markup declaration"))
                }
            }
            Some(b'?') => {
                self.scanner.advance(1);
                self.scan_pi(start, handler)
            }
            Some(c) if is_name_start_char(c) => self.scan_start_tag(start, handler),
            _ => Err(ScanError::new(
                start,
                "expected a name, '/', '!' or '?' after '<'",
            )),
        }
    }

    /// Scan a start tag; the scanner sits just after '<'
    fn scan_start_tag<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> ScanResult {
        let (name_start, name_end) = self
            .scanner
            .read_name()
            .ok_or_else(|| ScanError::new(start, "invalid element name"))?;
        let name_span = Span::from_range(name_start, name_end);

        // Parse attributes - reuse buffer to avoid per-element allocations
        self.attrs_buf.clear();

        loop {
            let had_space = self.skip_whitespace_counted();
            match self.scanner.peek() {
                Some(b'>') => {
                    self.scanner.advance(1);
                    let tag = Span::from_range(start, self.scanner.position());
                    return handler.start_element(name_span, tag, &self.attrs_buf, false);
                }
                Some(b'/') => {
                    if self.scanner.peek_at(1) != Some(b'>') {
                        return Err(ScanError::new(
                            self.scanner.position(),
                            "expected '>' after '/' in empty-element tag",
                        ));
                    }
                    self.scanner.advance(2);
                    let tag = Span::from_range(start, self.scanner.position());
                    return handler.start_element(name_span, tag, &self.attrs_buf, true);
                }
                Some(c) if is_name_start_char(c) => {
                    if !had_space {
                        return Err(ScanError::new(
                            self.scanner.position(),
                            "attributes must be separated by whitespace",
                        ));
                    }
                    let attr = self.scan_attribute()?;
                    self.attrs_buf.push(attr);
                }
                Some(_) => {
                    return Err(ScanError::new(
                        self.scanner.position(),
                        "unexpected character in start tag",
                    ))
                }
                None => return Err(ScanError::new(start, "unterminated start tag")),
            }
        }
    }

    /// Scan an attribute, returning (name_span, value_span)
    fn scan_attribute(&mut self) -> Result<(Span, Span), ScanError> {
        let attr_start = self.scanner.position();
        let (name_start, name_end) = self
            .scanner
            .read_name()
            .ok_or_else(|| ScanError::new(attr_start, "invalid attribute name"))?;

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            return Err(ScanError::new(attr_start, "attribute without '='"));
        }
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        let quote = match self.scanner.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(ScanError::new(attr_start, "attribute value must be quoted")),
        };
        self.scanner.advance(1);

        let value_start = self.scanner.position();
        let value_end = self
            .scanner
            .find_byte(quote)
            .ok_or_else(|| ScanError::new(attr_start, "unterminated attribute value"))?;
        if self.input[value_start..value_end].contains(&b'<') {
            return Err(ScanError::new(value_start, "'<' in attribute value"));
        }
        self.scanner.set_position(value_end + 1);

        Ok((
            Span::from_range(name_start, name_end),
            Span::from_range(value_start, value_end),
        ))
    }

    /// Scan an end tag; the scanner sits just after '</'
    fn scan_end_tag<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> ScanResult {
        let (name_start, name_end) = self
            .scanner
            .read_name()
            .ok_or_else(|| ScanError::new(start, "invalid end tag name"))?;

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(ScanError::new(start, "unterminated end tag"));
        }
        self.scanner.advance(1);

        let tag = Span::from_range(start, self.scanner.position());
        handler.end_element(Span::from_range(name_start, name_end), tag)
    }

    /// Scan text content up to the next '<'
    fn scan_text<H: ScanHandler>(&mut self, handler: &mut H) -> ScanResult {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(self.input.len());
        let needs_decode = memchr::memchr(b'&', &self.input[start..end]).is_some();
        self.scanner.set_position(end);
        handler.text(Span::from_range(start, end), needs_decode)
    }

    /// Scan a comment; the scanner sits just after '<!--'
    fn scan_comment<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> ScanResult {
        let content_start = self.scanner.position();
        let content_end = self
            .scanner
            .find_seq(b"-->")
            .ok_or_else(|| ScanError::new(start, "unterminated comment"))?;
        self.scanner.set_position(content_end + 3);
        handler.comment(Span::from_range(content_start, content_end))
    }

    /// Scan a CDATA section; the scanner sits just after '<![CDATA['
    fn scan_cdata<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> ScanResult {
        let content_start = self.scanner.position();
        let content_end = self
            .scanner
            .find_seq(b"]]>")
            .ok_or_else(|| ScanError::new(start, "unterminated CDATA section"))?;
        self.scanner.set_position(content_end + 3);
        handler.cdata(Span::from_range(content_start, content_end))
    }

    /// Scan a processing instruction; the scanner sits just after '<?'
    fn scan_pi<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> ScanResult {
        let (target_start, target_end) = self
            .scanner
            .read_name()
            .ok_or_else(|| ScanError::new(start, "invalid processing instruction target"))?;

        let close = self
            .scanner
            .find_seq(b"?>")
            .ok_or_else(|| ScanError::new(start, "unterminated processing instruction"))?;

        if close > target_end && !is_xml_whitespace(self.input[target_end]) {
            return Err(ScanError::new(
                target_end,
                "processing instruction target must be followed by whitespace",
            ));
        }
        self.scanner.skip_whitespace();
        let data_start = self.scanner.position().min(close);
        let data = (close > data_start).then(|| Span::from_range(data_start, close));
        self.scanner.set_position(close + 2);

        let target = &self.input[target_start..target_end];
        if target.eq_ignore_ascii_case(b"xml") {
            if start != 0 && !(start == 3 && self.input.starts_with(UTF8_BOM)) {
                return Err(ScanError::new(
                    start,
                    "XML declaration allowed only at the start of the document",
                ));
            }
            return handler.xml_declaration(data);
        }
        handler.processing_instruction(Span::from_range(target_start, target_end), data)
    }

    /// Scan DOCTYPE; the scanner sits on 'DOCTYPE'
    fn scan_doctype<H: ScanHandler>(&mut self, start: usize, handler: &mut H) -> ScanResult {
        self.scanner.advance(7);
        let content_start = self.scanner.position();

        // Find end of DOCTYPE, handling the internal subset and quoted literals
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        while let Some(c) = self.scanner.peek() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(c),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => {
                    let span = Span::from_range(content_start, self.scanner.position());
                    self.scanner.advance(1);
                    return handler.doctype(span);
                }
                _ => {}
            }
            self.scanner.advance(1);
        }
        Err(ScanError::new(start, "unterminated DOCTYPE"))
    }

    /// Skip whitespace, reporting whether any was skipped
    fn skip_whitespace_counted(&mut self) -> bool {
        let before = self.scanner.position();
        self.scanner.skip_whitespace();
        self.scanner.position() > before
    }
}

/// UTF-8 byte order mark
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
