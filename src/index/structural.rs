//! Structural Index - Main index structure
//!
//! Stores the entire XML document structure as offsets into the original input.
//! Memory efficient: a few dozen bytes per element, 20 per text node, and no
//! string storage at all.

use super::element::{ChildRef, IndexAttribute, IndexElement, IndexText, NO_NODE};
use super::namespace::NamespaceTable;

/// The structural index of an XML document
///
/// Memory layout optimized for cache efficiency:
/// - Elements stored contiguously in document order (index 0 is the root)
/// - Attributes stored contiguously, referenced by (start, count)
/// - Text-like nodes stored separately, linked via ChildRef
/// - Children stored as a flat list for each element
#[derive(Debug, Default)]
pub struct StructuralIndex {
    /// Element nodes, in start-tag order
    pub elements: Vec<IndexElement>,
    /// Text nodes (includes text, CDATA, comments, PIs)
    pub texts: Vec<IndexText>,
    /// Attributes (referenced by elements via attr_start/attr_count)
    pub attributes: Vec<IndexAttribute>,
    /// Interned namespace URIs and declarations (namespace-aware documents)
    pub namespaces: NamespaceTable,
    /// (start, count) into children_data for each element
    children_ranges: Vec<(u32, u32)>,
    /// Flat storage of all children references
    children_data: Vec<ChildRef>,
    /// Children of the document node: the root element plus top-level
    /// comments and processing instructions
    top_level: Vec<ChildRef>,
    /// Root element index (None until the first start tag)
    pub root: Option<u32>,
}

impl StructuralIndex {
    /// Create with estimated capacity
    pub fn with_capacity(elements: usize, texts: usize, attributes: usize) -> Self {
        Self {
            elements: Vec::with_capacity(elements),
            texts: Vec::with_capacity(texts),
            attributes: Vec::with_capacity(attributes),
            ..Self::default()
        }
    }

    /// Get an element by index
    #[inline]
    pub fn get_element(&self, idx: u32) -> Option<&IndexElement> {
        self.elements.get(idx as usize)
    }

    /// Get a mutable element by index
    #[inline]
    pub(crate) fn get_element_mut(&mut self, idx: u32) -> Option<&mut IndexElement> {
        self.elements.get_mut(idx as usize)
    }

    /// Get a text node by index
    #[inline]
    pub fn get_text(&self, idx: u32) -> Option<&IndexText> {
        self.texts.get(idx as usize)
    }

    /// Get element name from input
    #[inline]
    #[cfg(test)]
    pub fn element_name<'a>(&self, idx: u32, input: &'a [u8]) -> Option<&'a str> {
        self.get_element(idx)?.name.as_str(input)
    }

    /// Get attributes for an element
    #[inline]
    pub fn element_attributes(&self, idx: u32) -> &[IndexAttribute] {
        if let Some(elem) = self.get_element(idx) {
            let start = elem.attr_start as usize;
            let end = start + elem.attr_count as usize;
            if end <= self.attributes.len() {
                return &self.attributes[start..end];
            }
        }
        &[]
    }

    /// Get a raw (undecoded) attribute value by its literal name
    #[cfg(test)]
    pub fn get_attribute<'a>(&self, elem_idx: u32, name: &str, input: &'a [u8]) -> Option<&'a str> {
        let name_bytes = name.as_bytes();
        self.element_attributes(elem_idx)
            .iter()
            .find(|attr| attr.name.slice(input) == name_bytes)
            .and_then(|attr| attr.value.as_str(input))
    }

    /// Iterate over children of an element, in document order
    pub fn children(&self, elem_idx: u32) -> ChildIter<'_> {
        let (start, count) = self
            .children_ranges
            .get(elem_idx as usize)
            .copied()
            .unwrap_or((0, 0));
        ChildIter {
            children: &self.children_data[start as usize..(start + count) as usize],
        }
    }

    /// Iterate over the children of the document node
    pub fn top_level(&self) -> ChildIter<'_> {
        ChildIter {
            children: &self.top_level,
        }
    }

    /// Iterate over element children only (skip text nodes)
    pub fn element_children(&self, elem_idx: u32) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.children(elem_idx)
            .filter(ChildRef::is_element)
            .map(|child| child.index())
    }

    /// Iterate over text-like children only (skip elements)
    pub fn text_children(&self, elem_idx: u32) -> impl Iterator<Item = u32> + '_ {
        self.children(elem_idx)
            .filter(ChildRef::is_text)
            .map(|child| child.index())
    }

    /// Iterate over all descendants of an element (depth-first, document order)
    pub fn descendants(&self, elem_idx: u32) -> DescendantIter<'_> {
        let mut stack = Vec::with_capacity(32);
        // Add children in reverse order so first child is processed first
        stack.extend(self.children(elem_idx).rev());
        DescendantIter { index: self, stack }
    }

    /// Get parent element of an element
    #[inline]
    pub fn parent(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.parent)
    }

    /// Get first child element
    #[inline]
    pub fn first_child(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.first_child)
    }

    /// Get last child element
    #[inline]
    pub fn last_child(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.last_child)
    }

    /// Get next sibling element
    #[inline]
    pub fn next_sibling(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.next_sibling)
    }

    /// Get previous sibling element
    #[inline]
    pub fn prev_sibling(&self, elem_idx: u32) -> Option<u32> {
        link(self.get_element(elem_idx)?.prev_sibling)
    }

    /// Find the element whose start tag begins at `offset`
    pub fn element_starting_at(&self, offset: u32) -> Option<u32> {
        self.elements
            .binary_search_by_key(&offset, |e| e.extent.offset)
            .ok()
            .map(|i| i as u32)
    }

    /// Get total number of elements
    #[inline]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Get total number of text nodes
    #[inline]
    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    /// Get total number of attributes
    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Get length of children_data (for builder diagnostics)
    #[inline]
    pub(crate) fn children_data_len(&self) -> usize {
        self.children_data.len()
    }

    // === Builder methods (used by IndexBuilder) ===

    /// Add an element and return its index
    pub(crate) fn add_element(&mut self, elem: IndexElement) -> u32 {
        let idx = self.elements.len() as u32;
        self.elements.push(elem);
        idx
    }

    /// Add a text node and return its index
    pub(crate) fn add_text(&mut self, text: IndexText) -> u32 {
        let idx = self.texts.len() as u32;
        self.texts.push(text);
        idx
    }

    /// Add an attribute and return its index
    pub(crate) fn add_attribute(&mut self, attr: IndexAttribute) -> u32 {
        let idx = self.attributes.len() as u32;
        self.attributes.push(attr);
        idx
    }

    /// Link sibling elements in both directions
    pub(crate) fn link_siblings(&mut self, prev_idx: u32, next_idx: u32) {
        if let Some(prev) = self.elements.get_mut(prev_idx as usize) {
            prev.next_sibling = next_idx;
        }
        if let Some(next) = self.elements.get_mut(next_idx as usize) {
            next.prev_sibling = prev_idx;
        }
    }

    /// Shrink all internal vectors to fit their contents
    /// Called after building to release unused capacity
    pub(crate) fn shrink_to_fit(&mut self) {
        self.elements.shrink_to_fit();
        self.texts.shrink_to_fit();
        self.attributes.shrink_to_fit();
        self.children_ranges.shrink_to_fit();
        self.children_data.shrink_to_fit();
        self.top_level.shrink_to_fit();
        self.namespaces.shrink_to_fit();
    }

    /// Byte offset used to order siblings
    fn child_offset(&self, child: ChildRef) -> u32 {
        if child.is_text() {
            self.texts[child.index() as usize].span.offset
        } else {
            self.elements[child.index() as usize].extent.offset
        }
    }

    /// Build children from parent links
    ///
    /// Uses the parent field of elements and texts to build children_data
    /// and children_ranges, then sorts each list by offset so mixed content
    /// (e.g. `<p>A<b/>C</p>`) stays in document order.
    pub(crate) fn build_children_from_parents(&mut self) {
        let num_elements = self.elements.len();

        // Count children per element
        let mut counts = vec![0u32; num_elements];
        let parents = self
            .elements
            .iter()
            .map(|e| e.parent)
            .chain(self.texts.iter().map(|t| t.parent));
        for parent in parents {
            if let Some(count) = counts.get_mut(parent as usize) {
                *count += 1;
            }
        }

        // Compute offsets and reserve space
        let total: u32 = counts.iter().sum();
        self.children_ranges = Vec::with_capacity(num_elements);
        let mut offset = 0u32;
        for &count in &counts {
            self.children_ranges.push((offset, count));
            offset += count;
        }
        self.children_data = vec![ChildRef::element(0); total as usize];
        self.top_level.clear();

        let mut placed = vec![0u32; num_elements];
        let refs = (0..num_elements as u32)
            .map(|i| (self.elements[i as usize].parent, ChildRef::element(i)))
            .chain((0..self.texts.len() as u32).map(|i| (self.texts[i as usize].parent, ChildRef::text(i))))
            .collect::<Vec<_>>();
        for (parent, child) in refs {
            if parent == NO_NODE {
                self.top_level.push(child);
                continue;
            }
            let parent = parent as usize;
            let (start, _) = self.children_ranges[parent];
            self.children_data[(start + placed[parent]) as usize] = child;
            placed[parent] += 1;
        }

        for i in 0..num_elements {
            let (start, count) = self.children_ranges[i];
            if count > 1 {
                let mut slice = self.children_data[start as usize..(start + count) as usize].to_vec();
                slice.sort_by_key(|child| self.child_offset(*child));
                self.children_data[start as usize..(start + count) as usize].copy_from_slice(&slice);
            }
        }
        let mut top = std::mem::take(&mut self.top_level);
        top.sort_by_key(|child| self.child_offset(*child));
        self.top_level = top;
    }
}

#[inline]
fn link(idx: u32) -> Option<u32> {
    (idx != NO_NODE).then_some(idx)
}

/// Iterator over children of an element
#[derive(Debug, Clone)]
pub struct ChildIter<'a> {
    children: &'a [ChildRef],
}

impl Iterator for ChildIter<'_> {
    type Item = ChildRef;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, rest) = self.children.split_first()?;
        self.children = rest;
        Some(*first)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.children.len(), Some(self.children.len()))
    }
}

impl DoubleEndedIterator for ChildIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (last, rest) = self.children.split_last()?;
        self.children = rest;
        Some(*last)
    }
}

impl ExactSizeIterator for ChildIter<'_> {}

/// Iterator over descendants (depth-first)
pub struct DescendantIter<'a> {
    index: &'a StructuralIndex,
    stack: Vec<ChildRef>,
}

impl Iterator for DescendantIter<'_> {
    type Item = ChildRef;

    fn next(&mut self) -> Option<Self::Item> {
        let child = self.stack.pop()?;
        if child.is_element() {
            // Add in reverse order for depth-first traversal
            self.stack.extend(self.index.children(child.index()).rev());
        }
        Some(child)
    }
}
