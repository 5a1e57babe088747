//! Structural Index Module
//!
//! A memory-efficient representation of XML documents using only byte
//! offsets into the original input. This enables:
//!
//! - **Zero-copy strings**: Element names, attribute values, and text content
//!   are represented as (offset, length) spans into the original input.
//! - **Extent arithmetic**: every element records the byte range of its full
//!   markup, so containment is a comparison of two offsets.
//! - **Cache-friendly**: compact `Copy` structs stored contiguously.
//!
//! ## Architecture
//!
//! ```text
//! StructuralIndex
//! ├── elements: Vec<IndexElement>     # name, extent, tree links
//! ├── texts: Vec<IndexText>           # text, CDATA, comments, PIs
//! ├── attributes: Vec<IndexAttribute> # name/value spans
//! ├── namespaces: NamespaceTable      # interned URIs + declarations
//! └── children: flat storage of ChildRef
//! ```

pub mod builder;
pub mod element;
pub mod namespace;
pub mod span;
pub mod structural;

// Re-export what's needed externally
pub use span::Span;
pub use structural::StructuralIndex;
