//! xmlnav - cursor navigation and XPath queries over indexed XML
//!
//! A document is scanned once into an offset-only structural index. Every
//! operation after that works on byte offsets into the original input:
//!
//! - [`Cursor`]: movable, cloneable position with parent/child/sibling moves
//! - [`evaluate`]: XPath 1.0 location paths yielding independent cursors in
//!   document order, lazily where order allows
//! - [`is_within`] / [`position`]: containment as offset arithmetic
//! - [`Cursor::element_text`] / [`Cursor::attribute_text`]: decoded,
//!   whitespace-normalized extraction
//! - [`Cursor::to_tree`]: re-parse a matched element into a [`TreeNode`]
//! - [`evaluate_parallel`]: several expressions at once on the Rayon pool
//!
//! ```
//! use xmlnav::Document;
//!
//! let doc = Document::parse("<D><Org><E><Name>Alice</Name></E></Org></D>", false)?;
//! let root = doc.root_cursor();
//! let names: Vec<_> = xmlnav::evaluate(&root, "//Name")?
//!     .map(|c| c.element_text())
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(names, vec![Some("Alice".to_string())]);
//! # Ok::<(), xmlnav::Error>(())
//! ```

pub mod config;
pub mod containment;
mod core;
pub mod cursor;
pub mod document;
pub mod error;
pub mod extract;
mod index;
pub mod parallel;
pub mod tree;
pub mod xpath;

pub use config::{Config, ParseOptions};
pub use containment::{is_within, is_within_range, position, Fragment};
pub use cursor::Cursor;
pub use document::{Document, NodeKind};
pub use error::{Error, Result};
pub use extract::{first_text, normalize};
pub use parallel::{evaluate_map, evaluate_parallel};
pub use tree::{parse_fragment, TreeContent, TreeNode};
pub use xpath::{evaluate, evaluate_with, Matches, Namespaces};
