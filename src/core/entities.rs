//! XML Entity Decoding
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Uses Cow for zero-copy when no entities are present. Unknown entities
//! and references to characters outside the XML 1.0 `Char` production are
//! kept literally.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
#[inline]
pub fn decode_text(input: &str) -> Cow<'_, str> {
    // Fast path: check if there are any entities using SIMD
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

/// Decode all entity references in the input
pub fn decode_entities(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(amp_pos) = memchr(b'&', &bytes[pos..]) else {
            result.push_str(&input[pos..]);
            break;
        };
        // '&' and ';' are ASCII so every slice boundary below is a char boundary
        result.push_str(&input[pos..pos + amp_pos]);
        pos += amp_pos;

        match memchr(b';', &bytes[pos..]) {
            Some(semi_offset) => match decode_entity(&input[pos + 1..pos + semi_offset]) {
                Some(c) => {
                    result.push(c);
                    pos += semi_offset + 1;
                }
                None => {
                    result.push('&');
                    pos += 1;
                }
            },
            None => {
                result.push('&');
                pos += 1;
            }
        }
    }

    result
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        return decode_numeric_entity(numeric);
    }
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Decode a numeric character reference
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let codepoint = match entity.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => entity.parse::<u32>().ok()?,
    };
    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities_borrows() {
        let decoded = decode_text("hello world");
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn test_builtin_entities() {
        assert_eq!(decode_text("&lt;a&gt; &amp; &quot;b&quot; &apos;c&apos;"), "<a> & \"b\" 'c'");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_text("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(decode_text("caf&#233;"), "café");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(decode_text("&nbsp;x"), "&nbsp;x");
        assert_eq!(decode_text("a & b"), "a & b");
    }

    #[test]
    fn test_invalid_char_reference_kept() {
        assert_eq!(decode_text("&#0;"), "&#0;");
        assert_eq!(decode_text("&#xD800;"), "&#xD800;");
    }

    #[test]
    fn test_non_ascii_around_entities() {
        assert_eq!(decode_text("é&amp;ü"), "é&ü");
    }
}
