//! Core XML scanning primitives
//!
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Entities: XML entity decoding with Cow (zero-copy when possible)
//! - UnifiedScanner: ScanHandler-based scanner for index and tree building

pub mod entities;
pub mod scanner;
pub mod unified_scanner;
