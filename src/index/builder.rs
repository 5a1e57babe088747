//! Index Builder
//!
//! Builds a StructuralIndex from XML parsing events.
//! Implements the ScanHandler trait for use with UnifiedScanner, and enforces
//! the well-formedness rules the scanner cannot see on its own: tag nesting,
//! a single root element, no character data outside it, unique attributes,
//! and (namespace-aware documents) bound prefixes.
//!
//! Memory-efficient: builds children from parent links after scan,
//! avoiding temporary buffers during construction.

use std::collections::HashSet;

use super::element::{element_flags, IndexAttribute, IndexElement, IndexText, NO_NAMESPACE, NO_NODE};
use super::namespace::NamespaceResolver;
use super::span::Span;
use super::structural::StructuralIndex;
use crate::config::Config;
use crate::core::entities::decode_text;
use crate::core::unified_scanner::{ScanError, ScanHandler, ScanResult, UnifiedScanner, UTF8_BOM};

/// Builder state for constructing a StructuralIndex
///
/// Uses a memory-efficient design:
/// - Stack stores only element indices during scan
/// - Children are built from parent links in finish()
pub struct IndexBuilder<'a> {
    /// The index being built
    index: StructuralIndex,
    /// Original input bytes, for name comparisons and namespace declarations
    input: &'a [u8],
    /// Stack of open element indices
    stack: Vec<u32>,
    /// Previous sibling element at each depth (for linking siblings)
    prev_sibling_at_depth: Vec<Option<u32>>,
    /// Present only for namespace-aware builds
    resolver: Option<NamespaceResolver<'a>>,
}

impl<'a> IndexBuilder<'a> {
    /// Create a new builder for the given input
    pub fn new(input: &'a [u8], namespace_aware: bool) -> Self {
        // Estimate capacity based on input size
        // Complex XML with nested elements: ~1 element per 35 bytes
        // Whitespace between tags creates many text nodes: ~2 texts per element
        // Attributes: ~0.4 per element on average
        let estimated_elements = (input.len() / 35).max(16);
        let estimated_texts = estimated_elements * 2;
        let estimated_attrs = (estimated_elements * 2) / 5;

        let mut index = StructuralIndex::with_capacity(estimated_elements, estimated_texts, estimated_attrs);
        let resolver = namespace_aware.then(|| NamespaceResolver::new(&mut index.namespaces));

        Self {
            index,
            input,
            stack: Vec::with_capacity(32),
            prev_sibling_at_depth: Vec::with_capacity(32),
            resolver,
        }
    }

    /// Finish building and return the index
    pub fn finish(mut self) -> Result<StructuralIndex, ScanError> {
        if let Some(&open) = self.stack.last() {
            let (offset, name) = self
                .index
                .get_element(open)
                .map(|e| (e.extent.offset as usize, e.name.as_str(self.input).unwrap_or("")))
                .unwrap_or((0, ""));
            return Err(ScanError::new(offset, format!("unclosed element <{name}>")));
        }
        if self.index.root.is_none() {
            return Err(ScanError::new(self.input.len(), "no root element"));
        }

        // Build children from parent links
        self.index.build_children_from_parents();

        // Release over-allocated capacity from initial estimates.
        // Estimates are based on input size heuristics and often over-allocate
        // by 2-3x. This reclaims significant memory for long-lived documents.
        self.index.shrink_to_fit();

        tracing::debug!(
            target: "xmlnav::index",
            elements = self.index.element_count(),
            texts = self.index.text_count(),
            attributes = self.index.attribute_count(),
            namespaces = self.index.namespaces.len(),
            "structural index built"
        );

        if Config::global().debug_index {
            let elem_bytes = self.index.elements.capacity() * std::mem::size_of::<IndexElement>();
            let text_bytes = self.index.texts.capacity() * std::mem::size_of::<IndexText>();
            let attr_bytes = self.index.attributes.capacity() * std::mem::size_of::<IndexAttribute>();
            let child_bytes =
                self.index.children_data_len() * std::mem::size_of::<super::element::ChildRef>();
            tracing::debug!(
                target: "xmlnav::index",
                elem_bytes,
                text_bytes,
                attr_bytes,
                child_bytes,
                input_bytes = self.input.len(),
                "structural index sizing"
            );
        }

        Ok(self.index)
    }

    /// Get the current depth (number of open elements)
    #[inline]
    fn current_depth(&self) -> u32 {
        self.stack.len() as u32
    }

    /// Get the current parent element index
    #[inline]
    fn current_parent(&self) -> u32 {
        self.stack.last().copied().unwrap_or(NO_NODE)
    }

    #[inline]
    fn bytes(&self, span: Span) -> &'a [u8] {
        span.slice(self.input)
    }

    /// Reject a second attribute with the same literal name
    fn check_unique_attributes(&self, attrs: &[(Span, Span)]) -> ScanResult {
        let duplicate = |name: &Span| {
            let bytes = self.bytes(*name);
            ScanError::new(
                name.offset as usize,
                format!("duplicate attribute '{}'", String::from_utf8_lossy(bytes)),
            )
        };
        // Pairwise scan for the common short lists, hashing past that
        if attrs.len() <= 16 {
            for (i, (name, _)) in attrs.iter().enumerate() {
                let bytes = self.bytes(*name);
                if attrs[..i].iter().any(|(prev, _)| self.bytes(*prev) == bytes) {
                    return Err(duplicate(name));
                }
            }
            return Ok(());
        }
        let mut seen = HashSet::with_capacity(attrs.len());
        for (name, _) in attrs {
            if !seen.insert(self.bytes(*name)) {
                return Err(duplicate(name));
            }
        }
        Ok(())
    }

    /// Bind the `xmlns` declarations of a start tag in a fresh scope
    fn declare_namespaces(&mut self, attrs: &[(Span, Span)]) -> ScanResult {
        let input = self.input;
        let Some(resolver) = self.resolver.as_mut() else {
            return Ok(());
        };
        resolver.push_scope();
        for (name, value) in attrs {
            let name_bytes = name.slice(input);
            let prefix = match name_bytes.strip_prefix(b"xmlns") {
                Some([]) => &[][..],
                Some([b':', prefix @ ..]) => prefix,
                _ => continue,
            };
            let uri = decode_text(value.as_str(input).unwrap_or(""));
            if uri.is_empty() && !prefix.is_empty() {
                return Err(ScanError::new(
                    name.offset as usize,
                    format!(
                        "empty namespace URI for prefix '{}'",
                        String::from_utf8_lossy(prefix)
                    ),
                ));
            }
            let id = if uri.is_empty() {
                NO_NAMESPACE
            } else {
                self.index.namespaces.intern(&uri)
            };
            resolver.declare(prefix, id);
            self.index
                .namespaces
                .record(std::str::from_utf8(prefix).unwrap_or(""), id);
        }
        Ok(())
    }

    /// Resolve the namespace of a qualified name in the current scope
    fn resolve_name(&self, name: Span, is_attribute: bool) -> Result<u32, ScanError> {
        let Some(resolver) = self.resolver.as_ref() else {
            return Ok(NO_NAMESPACE);
        };
        let bytes = self.bytes(name);
        match bytes.iter().position(|&b| b == b':') {
            Some(colon) => resolver.resolve(&bytes[..colon]).ok_or_else(|| {
                ScanError::new(
                    name.offset as usize,
                    format!(
                        "unbound namespace prefix '{}'",
                        String::from_utf8_lossy(&bytes[..colon])
                    ),
                )
            }),
            // Unprefixed attributes are never in the default namespace
            None if is_attribute => Ok(NO_NAMESPACE),
            None => Ok(resolver.resolve_default()),
        }
    }

    fn is_namespace_declaration(&self, name: Span) -> bool {
        let bytes = self.bytes(name);
        self.resolver.is_some() && (bytes == b"xmlns" || bytes.starts_with(b"xmlns:"))
    }

    /// Handle start of an element
    fn open_element(&mut self, name: Span, tag: Span, attrs: &[(Span, Span)], is_empty: bool) -> ScanResult {
        if self.stack.is_empty() && self.index.root.is_some() {
            return Err(ScanError::new(tag.offset as usize, "more than one root element"));
        }
        self.check_unique_attributes(attrs)?;
        self.declare_namespaces(attrs)?;

        let depth = self.current_depth();
        let parent = self.current_parent();

        let mut elem = IndexElement::new(name, tag, parent, depth);
        elem.namespace = self.resolve_name(name, false)?;
        if is_empty {
            elem.flags |= element_flags::IS_EMPTY;
        }

        // Add attributes; namespace declarations are not attributes in
        // namespace-aware documents
        elem.attr_start = self.index.attributes.len() as u32;
        for (attr_name, attr_value) in attrs {
            if self.is_namespace_declaration(*attr_name) {
                continue;
            }
            let mut attr = IndexAttribute::new(*attr_name, *attr_value);
            attr.namespace = self.resolve_name(*attr_name, true)?;
            self.index.add_attribute(attr);
            elem.attr_count += 1;
        }

        let elem_idx = self.index.add_element(elem);
        if self.index.root.is_none() {
            self.index.root = Some(elem_idx);
        }

        // Link siblings at this depth
        let depth = depth as usize;
        if self.prev_sibling_at_depth.len() <= depth {
            self.prev_sibling_at_depth.resize(depth + 1, None);
        }
        if let Some(prev_idx) = self.prev_sibling_at_depth[depth] {
            self.index.link_siblings(prev_idx, elem_idx);
        }
        self.prev_sibling_at_depth[depth] = Some(elem_idx);
        // Clear previous siblings at deeper levels
        self.prev_sibling_at_depth.truncate(depth + 1);

        if let Some(parent_elem) = self.index.get_element_mut(parent) {
            if parent_elem.first_child == NO_NODE {
                parent_elem.first_child = elem_idx;
            }
            parent_elem.last_child = elem_idx;
        }

        if is_empty {
            if let Some(resolver) = self.resolver.as_mut() {
                resolver.pop_scope();
            }
        } else {
            self.stack.push(elem_idx);
        }
        Ok(())
    }

    /// Handle end of an element
    fn close_element(&mut self, name: Span, tag: Span) -> ScanResult {
        let Some(elem_idx) = self.stack.pop() else {
            return Err(ScanError::new(
                tag.offset as usize,
                format!(
                    "end tag </{}> without a matching start tag",
                    String::from_utf8_lossy(self.bytes(name))
                ),
            ));
        };
        let input = self.input;
        let Some(elem) = self.index.get_element_mut(elem_idx) else {
            return Err(ScanError::new(tag.offset as usize, "corrupt element stack"));
        };
        let open_name = elem.name.slice(input);
        if open_name != name.slice(input) {
            return Err(ScanError::new(
                tag.offset as usize,
                format!(
                    "mismatched end tag: expected </{}>, found </{}>",
                    String::from_utf8_lossy(open_name),
                    String::from_utf8_lossy(name.slice(input))
                ),
            ));
        }
        elem.extent = Span::new(elem.extent.offset, tag.end() - elem.extent.offset);

        if let Some(resolver) = self.resolver.as_mut() {
            resolver.pop_scope();
        }
        Ok(())
    }

    /// Whitespace (and a leading byte order mark) may surround the root
    fn is_ignorable_prolog_text(&self, span: Span) -> bool {
        let mut bytes = self.bytes(span);
        if span.offset == 0 {
            bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        }
        bytes.iter().all(|&b| crate::core::scanner::is_xml_whitespace(b))
    }
}

// ============================================================================
// ScanHandler Implementation for Zero-Copy Index Building
// ============================================================================

impl ScanHandler for IndexBuilder<'_> {
    fn start_element(&mut self, name: Span, tag: Span, attrs: &[(Span, Span)], is_empty: bool) -> ScanResult {
        self.open_element(name, tag, attrs, is_empty)
    }

    fn end_element(&mut self, name: Span, tag: Span) -> ScanResult {
        self.close_element(name, tag)
    }

    fn text(&mut self, span: Span, needs_entity_decode: bool) -> ScanResult {
        if self.stack.is_empty() {
            if self.is_ignorable_prolog_text(span) {
                return Ok(());
            }
            return Err(ScanError::new(span.offset as usize, "text outside the root element"));
        }
        let parent = self.current_parent();
        self.index.add_text(IndexText::text(span, parent, needs_entity_decode));
        Ok(())
    }

    fn cdata(&mut self, span: Span) -> ScanResult {
        if self.stack.is_empty() {
            return Err(ScanError::new(span.offset as usize, "CDATA section outside the root element"));
        }
        let parent = self.current_parent();
        self.index.add_text(IndexText::cdata(span, parent));
        Ok(())
    }

    fn comment(&mut self, span: Span) -> ScanResult {
        let parent = self.current_parent();
        self.index.add_text(IndexText::comment(span, parent));
        Ok(())
    }

    fn processing_instruction(&mut self, target: Span, data: Option<Span>) -> ScanResult {
        let parent = self.current_parent();
        self.index.add_text(IndexText::pi(target, data, parent));
        Ok(())
    }

    fn doctype(&mut self, content: Span) -> ScanResult {
        if self.index.root.is_some() {
            return Err(ScanError::new(content.offset as usize, "DOCTYPE after the root element"));
        }
        Ok(())
    }
}

// ============================================================================
// Build Functions
// ============================================================================

/// Build a StructuralIndex using UnifiedScanner (zero-copy)
///
/// This uses the UnifiedScanner which directly produces Spans without
/// intermediate string allocations.
pub fn build_index(input: &[u8], namespace_aware: bool) -> Result<StructuralIndex, ScanError> {
    let mut builder = IndexBuilder::new(input, namespace_aware);
    UnifiedScanner::new(input).scan(&mut builder)?;
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(xml: &str) -> StructuralIndex {
        build_index(xml.as_bytes(), false).unwrap()
    }

    fn build_err(xml: &str) -> ScanError {
        build_index(xml.as_bytes(), false).unwrap_err()
    }

    #[test]
    fn test_build_simple() {
        let index = build("<root><child>text</child></root>");
        assert_eq!(index.element_count(), 2);
        assert_eq!(index.root, Some(0));
        assert_eq!(index.elements[0].extent, Span::new(0, 32));
        assert_eq!(index.elements[1].extent, Span::new(6, 19));
    }

    #[test]
    fn test_build_with_attributes() {
        let index = build("<root id=\"1\" name=\"test\"><child/></root>");
        assert_eq!(index.element_count(), 2);
        assert_eq!(index.attribute_count(), 2);
        assert!(index.elements[1].is_empty());
    }

    #[test]
    fn test_build_nested_links() {
        let index = build("<a><b><c/></b><d/><e/></a>");
        assert_eq!(index.element_count(), 5);
        assert_eq!(index.first_child(0), Some(1));
        assert_eq!(index.last_child(0), Some(4));
        assert_eq!(index.first_child(1), Some(2));
        assert_eq!(index.last_child(1), Some(2));
        assert_eq!(index.next_sibling(1), Some(3));
        assert_eq!(index.next_sibling(3), Some(4));
        assert_eq!(index.prev_sibling(4), Some(3));
        assert_eq!(index.next_sibling(2), None);
        assert_eq!(index.elements[2].depth, 2);
    }

    #[test]
    fn test_sibling_chain_reset_between_parents() {
        let index = build("<a><b><c/></b><d><e/></d></a>");
        // c and e are at the same depth under different parents
        assert_eq!(index.next_sibling(2), None);
        assert_eq!(index.prev_sibling(4), None);
    }

    #[test]
    fn test_build_with_mixed_content() {
        let index = build("<root>hello<child>world</child>!</root>");
        assert_eq!(index.text_count(), 3);
        let kinds: Vec<bool> = index.children(0).map(|c| c.is_text()).collect();
        assert_eq!(kinds, vec![true, false, true]);
    }

    #[test]
    fn test_prolog_and_epilog() {
        let index = build("\u{feff}<?xml version=\"1.0\"?>\n<!-- head -->\n<r/>\n<?tail x?>\n");
        assert_eq!(index.element_count(), 1);
        assert_eq!(index.top_level().count(), 3);
    }

    #[test]
    fn test_well_formedness_errors() {
        assert!(build_err("").message.contains("no root"));
        assert!(build_err("<a/><b/>").message.contains("more than one root"));
        assert!(build_err("<a></b>").message.contains("mismatched"));
        assert!(build_err("</a>").message.contains("without a matching"));
        assert!(build_err("<a><b></b>").message.contains("unclosed"));
        assert!(build_err("<a x='1' x='2'/>").message.contains("duplicate"));
        assert!(build_err("text<a/>").message.contains("outside the root"));
        assert!(build_err("<a/><![CDATA[x]]>").message.contains("CDATA"));
    }

    #[test]
    fn test_mismatch_offset() {
        let err = build_err("<a><b></c></a>");
        assert_eq!(err.offset, 6);
    }

    #[test]
    fn test_namespace_resolution() {
        let xml = "<r xmlns=\"urn:d\" xmlns:p=\"urn:p\"><p:a p:x=\"1\" y=\"2\"/><b xmlns=\"\"/></r>";
        let index = build_index(xml.as_bytes(), true).unwrap();
        let ns = &index.namespaces;
        assert_eq!(ns.uri(index.elements[0].namespace), Some("urn:d"));
        assert_eq!(ns.uri(index.elements[1].namespace), Some("urn:p"));
        assert_eq!(index.elements[2].namespace, NO_NAMESPACE);
        // xmlns declarations are not attributes
        assert_eq!(index.elements[0].attr_count, 0);
        let attrs = index.element_attributes(1);
        assert_eq!(ns.uri(attrs[0].namespace), Some("urn:p"));
        assert_eq!(attrs[1].namespace, NO_NAMESPACE);
        let decls: Vec<_> = ns.declarations().collect();
        assert_eq!(decls, vec![("", "urn:d"), ("p", "urn:p"), ("", "")]);
    }

    #[test]
    fn test_unbound_prefix_is_malformed_when_namespace_aware() {
        let xml = b"<p:a/>";
        assert!(build_index(xml, false).is_ok());
        let err = build_index(xml, true).unwrap_err();
        assert!(err.message.contains("unbound namespace prefix 'p'"));
    }

    #[test]
    fn test_namespace_scope_ends_with_element() {
        let xml = b"<r><a xmlns:p=\"urn:p\"/><p:b/></r>";
        assert!(build_index(xml, true).is_err());
    }

    fn nested(depth: usize) -> String {
        format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[test]
    fn test_nesting_past_u16_depth() {
        let depth = usize::from(u16::MAX) + 2;
        let xml = nested(depth);
        for namespace_aware in [false, true] {
            let index = build_index(xml.as_bytes(), namespace_aware).unwrap();
            assert_eq!(index.element_count(), depth);
            assert_eq!(index.next_sibling(0), None);
            let deepest = (depth - 1) as u32;
            assert_eq!(index.elements[deepest as usize].depth, deepest);
            assert_eq!(index.prev_sibling(deepest), None);
            assert_eq!(index.parent(deepest), Some(deepest - 1));
        }
    }

    #[test]
    fn test_attribute_count_past_u16() {
        let count = usize::from(u16::MAX) + 10;
        let attrs: String = (0..count).map(|i| format!(" a{i}=\"{i}\"")).collect();
        let index = build(&format!("<r{attrs}/>"));
        assert_eq!(index.elements[0].attr_count as usize, count);
        let last = index.element_attributes(0).last().unwrap();
        assert_eq!(last.value.as_str(format!("<r{attrs}/>").as_bytes()), Some("65544"));

        let dup = format!("<r{attrs} a7=\"x\"/>");
        assert!(build_err(&dup).message.contains("duplicate attribute 'a7'"));
    }
}
