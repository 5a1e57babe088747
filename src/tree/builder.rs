//! Fragment parsing into [`TreeNode`] values
//!
//! Drives the same [`UnifiedScanner`] as index building, but materializes
//! names and decoded text instead of recording spans.

use crate::core::entities::decode_text;
use crate::core::scanner::is_xml_whitespace;
use crate::core::unified_scanner::{ScanError, ScanHandler, ScanResult, UnifiedScanner};
use crate::error::{Error, Result};
use crate::index::Span;

use super::node::{TreeContent, TreeNode};

/// Builds a single-element tree from scan events
struct TreeBuilder<'a> {
    input: &'a [u8],
    /// Open elements, innermost last
    stack: Vec<TreeNode>,
    root: Option<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            stack: Vec::with_capacity(16),
            root: None,
        }
    }

    fn str(&self, span: Span) -> std::result::Result<&'a str, ScanError> {
        span.as_str(self.input)
            .ok_or_else(|| ScanError::new(span.offset as usize, "invalid UTF-8"))
    }

    fn finish(self) -> std::result::Result<TreeNode, ScanError> {
        if let Some(open) = self.stack.last() {
            return Err(ScanError::new(
                self.input.len(),
                format!("unclosed element <{}>", open.tag),
            ));
        }
        self.root
            .ok_or_else(|| ScanError::new(self.input.len(), "no element"))
    }

    /// Attach a completed element to its parent, or make it the root
    fn attach(&mut self, node: TreeNode, offset: usize) -> ScanResult {
        match self.stack.last_mut() {
            Some(parent) => parent.content.push(TreeContent::Node(node)),
            None if self.root.is_some() => {
                return Err(ScanError::new(offset, "trailing content after the element"));
            }
            None => self.root = Some(node),
        }
        Ok(())
    }

    fn character_data(&mut self, span: Span, text: &str) -> ScanResult {
        let whitespace = text.bytes().all(is_xml_whitespace);
        match self.stack.last_mut() {
            Some(_) if whitespace => Ok(()),
            Some(parent) => {
                parent.push_text(text);
                Ok(())
            }
            None if whitespace => Ok(()),
            None => Err(ScanError::new(span.offset as usize, "text outside the element")),
        }
    }
}

impl ScanHandler for TreeBuilder<'_> {
    fn start_element(&mut self, name: Span, tag: Span, attrs: &[(Span, Span)], is_empty: bool) -> ScanResult {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ScanError::new(tag.offset as usize, "trailing content after the element"));
        }

        let mut node = TreeNode::new(self.str(name)?);
        for &(attr_name, value) in attrs {
            let attr_name = self.str(attr_name)?;
            let value = decode_text(self.str(value)?).into_owned();
            if node.attrs.insert(attr_name.to_string(), value).is_some() {
                return Err(ScanError::new(
                    tag.offset as usize,
                    format!("duplicate attribute `{attr_name}`"),
                ));
            }
        }

        if is_empty {
            self.attach(node, tag.offset as usize)
        } else {
            self.stack.push(node);
            Ok(())
        }
    }

    fn end_element(&mut self, name: Span, tag: Span) -> ScanResult {
        let name = self.str(name)?;
        let Some(node) = self.stack.pop() else {
            return Err(ScanError::new(tag.offset as usize, format!("unexpected end tag </{name}>")));
        };
        if node.tag != name {
            return Err(ScanError::new(
                tag.offset as usize,
                format!("end tag </{name}> does not match <{}>", node.tag),
            ));
        }
        self.attach(node, tag.offset as usize)
    }

    fn text(&mut self, span: Span, needs_entity_decode: bool) -> ScanResult {
        let raw = self.str(span)?;
        if needs_entity_decode {
            let decoded = decode_text(raw);
            self.character_data(span, &decoded)
        } else {
            self.character_data(span, raw)
        }
    }

    fn cdata(&mut self, span: Span) -> ScanResult {
        let raw = self.str(span)?;
        if self.stack.is_empty() {
            return Err(ScanError::new(span.offset as usize, "CDATA section outside the element"));
        }
        self.character_data(span, raw)
    }

    fn comment(&mut self, _span: Span) -> ScanResult {
        Ok(())
    }

    fn processing_instruction(&mut self, _target: Span, _data: Option<Span>) -> ScanResult {
        Ok(())
    }
}

/// Parse exactly one element, optionally surrounded by whitespace, comments
/// or processing instructions, into a [`TreeNode`]
///
/// Attribute values and text are entity-decoded. Whitespace-only text is
/// dropped, adjacent text and CDATA runs are merged.
pub fn parse_fragment(bytes: &[u8]) -> Result<TreeNode> {
    let mut builder = TreeBuilder::new(bytes);
    UnifiedScanner::new(bytes)
        .scan(&mut builder)
        .and_then(|()| builder.finish())
        .map_err(|err| Error::FragmentParse(format!("{} at byte {}", err.message, err.offset)))
}
