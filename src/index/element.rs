//! Structural Index Element Types
//!
//! Compact structures for storing XML structure as offsets into the
//! original input.

use super::span::Span;

/// Flags for IndexElement
pub mod element_flags {
    /// Element is empty (self-closing)
    pub const IS_EMPTY: u16 = 0x0004;
}

/// Flags for IndexText
pub mod text_flags {
    /// Text needs entity decoding (contains &amp; etc.)
    pub const NEEDS_ENTITY_DECODE: u16 = 0x0001;
    /// Text is CDATA section
    pub const IS_CDATA: u16 = 0x0002;
    /// Text is a comment
    pub const IS_COMMENT: u16 = 0x0004;
    /// Text is a processing instruction
    pub const IS_PI: u16 = 0x0008;
}

/// Sentinel value for "no node"
pub const NO_NODE: u32 = u32::MAX;

/// Sentinel value for "no namespace"
pub const NO_NAMESPACE: u32 = u32::MAX;

/// An element in the structural index
///
/// Stores only offsets into the input. Sibling and child links cover
/// element nodes only; mixed content is reached through the child list.
#[derive(Debug, Clone, Copy)]
pub struct IndexElement {
    /// Element name span (tag name in input)
    pub name: Span,
    /// Full markup extent, from `<` of the start tag to `>` of the end tag
    pub extent: Span,
    /// Parent element index (NO_NODE for root)
    pub parent: u32,
    /// First child element (NO_NODE if none)
    pub first_child: u32,
    /// Last child element (NO_NODE if none)
    pub last_child: u32,
    /// Next sibling element (NO_NODE if last)
    pub next_sibling: u32,
    /// Previous sibling element (NO_NODE if first)
    pub prev_sibling: u32,
    /// Start index in attributes array
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u32,
    /// Depth in document tree (0 = root element)
    pub depth: u32,
    /// Flags (see element_flags)
    pub flags: u16,
    /// Namespace table id, NO_NAMESPACE when unqualified or not resolved
    pub namespace: u32,
}

impl IndexElement {
    /// Create a new element whose extent starts at the start tag
    #[inline]
    pub fn new(name: Span, start_tag: Span, parent: u32, depth: u32) -> Self {
        Self {
            name,
            extent: start_tag,
            parent,
            first_child: NO_NODE,
            last_child: NO_NODE,
            next_sibling: NO_NODE,
            prev_sibling: NO_NODE,
            attr_start: 0,
            attr_count: 0,
            depth,
            flags: 0,
            namespace: NO_NAMESPACE,
        }
    }

    /// Check if this is an empty/self-closing element
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flags & element_flags::IS_EMPTY != 0
    }
}

/// A text-like node: text, CDATA, comment or processing instruction
#[derive(Debug, Clone, Copy)]
pub struct IndexText {
    /// Content span (PI target for processing instructions)
    pub span: Span,
    /// PI data span, empty for everything else
    pub data: Span,
    /// Parent element index
    pub parent: u32,
    /// Flags (see text_flags)
    pub flags: u16,
}

impl IndexText {
    fn with_flags(span: Span, parent: u32, flags: u16) -> Self {
        Self {
            span,
            data: Span::empty(),
            parent,
            flags,
        }
    }

    /// Create a text node
    #[inline]
    pub fn text(span: Span, parent: u32, needs_decode: bool) -> Self {
        let flags = if needs_decode {
            text_flags::NEEDS_ENTITY_DECODE
        } else {
            0
        };
        Self::with_flags(span, parent, flags)
    }

    /// Create a CDATA section
    #[inline]
    pub fn cdata(span: Span, parent: u32) -> Self {
        Self::with_flags(span, parent, text_flags::IS_CDATA)
    }

    /// Create a comment
    #[inline]
    pub fn comment(span: Span, parent: u32) -> Self {
        Self::with_flags(span, parent, text_flags::IS_COMMENT)
    }

    /// Create a processing instruction
    #[inline]
    pub fn pi(target: Span, data: Option<Span>, parent: u32) -> Self {
        Self {
            data: data.unwrap_or_default(),
            ..Self::with_flags(target, parent, text_flags::IS_PI)
        }
    }

    /// Check if this text needs entity decoding
    #[inline]
    pub fn needs_decode(&self) -> bool {
        self.flags & text_flags::NEEDS_ENTITY_DECODE != 0
    }

    /// Check if this is a CDATA section
    #[inline]
    pub fn is_cdata(&self) -> bool {
        self.flags & text_flags::IS_CDATA != 0
    }

    /// Check if this is a comment
    #[inline]
    pub fn is_comment(&self) -> bool {
        self.flags & text_flags::IS_COMMENT != 0
    }

    /// Check if this is a processing instruction
    #[inline]
    pub fn is_pi(&self) -> bool {
        self.flags & text_flags::IS_PI != 0
    }

    /// Check if this is regular text (not CDATA/comment/PI)
    #[inline]
    pub fn is_text(&self) -> bool {
        self.flags & (text_flags::IS_CDATA | text_flags::IS_COMMENT | text_flags::IS_PI) == 0
    }

    /// Character data: text or CDATA
    #[inline]
    pub fn is_character_data(&self) -> bool {
        self.is_text() || self.is_cdata()
    }
}

/// An attribute in the structural index
#[derive(Debug, Clone, Copy)]
pub struct IndexAttribute {
    /// Attribute name span
    pub name: Span,
    /// Attribute value span (between the quotes)
    pub value: Span,
    /// Namespace table id, NO_NAMESPACE when unqualified or not resolved
    pub namespace: u32,
}

impl IndexAttribute {
    /// Create a new attribute
    #[inline]
    pub fn new(name: Span, value: Span) -> Self {
        Self {
            name,
            value,
            namespace: NO_NAMESPACE,
        }
    }
}

/// A child reference - can be either an element or a text node
///
/// We use a discriminated union approach with the high bit of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRef(u32);

impl ChildRef {
    /// Bit flag indicating this is a text node reference
    const TEXT_BIT: u32 = 0x8000_0000;

    /// Create a reference to an element
    #[inline]
    pub const fn element(idx: u32) -> Self {
        debug_assert!(idx < Self::TEXT_BIT);
        Self(idx)
    }

    /// Create a reference to a text node
    #[inline]
    pub const fn text(idx: u32) -> Self {
        debug_assert!(idx < Self::TEXT_BIT);
        Self(idx | Self::TEXT_BIT)
    }

    /// Check if this is a text node reference
    #[inline]
    pub const fn is_text(&self) -> bool {
        self.0 & Self::TEXT_BIT != 0
    }

    /// Check if this is an element reference
    #[inline]
    pub const fn is_element(&self) -> bool {
        self.0 & Self::TEXT_BIT == 0
    }

    /// Get the index (strips the type bit)
    #[inline]
    pub const fn index(&self) -> u32 {
        self.0 & !Self::TEXT_BIT
    }
}
