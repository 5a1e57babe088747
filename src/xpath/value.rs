//! XPath Value Types
//!
//! XPath 1.0 has four data types: node-set, boolean, number, and string.
//! Node-set conversions need the document to read string-values.

use crate::document::{Document, Position};

/// XPath value types
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub(crate) enum Value {
    /// A set of nodes (document order, no duplicates)
    NodeSet(Vec<Position>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// XPath boolean() semantics
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    /// XPath number() semantics
    pub fn to_number(&self, doc: &Document) -> f64 {
        match self {
            Value::NodeSet(_) => parse_number(&self.to_string_value(doc)),
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
        }
    }

    /// XPath string() semantics: a node-set converts through its first node
    pub fn to_string_value(&self, doc: &Document) -> String {
        match self {
            Value::NodeSet(nodes) => nodes
                .first()
                .map(|&pos| doc.string_value(pos))
                .unwrap_or_default(),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
        }
    }

    pub fn into_nodeset(self) -> Vec<Position> {
        match self {
            Value::NodeSet(nodes) => nodes,
            _ => Vec::new(),
        }
    }
}

/// Parse per the XPath Number production; anything else is NaN
pub(crate) fn parse_number(s: &str) -> f64 {
    let s = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let digits = s.strip_prefix('-').unwrap_or(s);
    let valid = !digits.is_empty()
        && digits != "."
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if valid {
        s.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse("<r><a>12</a><b>x</b></r>", false).unwrap()
    }

    #[test]
    fn test_boolean_conversion() {
        assert!(Value::NodeSet(vec![Position::Document]).to_boolean());
        assert!(!Value::NodeSet(vec![]).to_boolean());
        assert!(Value::Boolean(true).to_boolean());
        assert!(Value::Number(1.0).to_boolean());
        assert!(!Value::Number(0.0).to_boolean());
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(Value::String("hello".to_string()).to_boolean());
        assert!(!Value::String(String::new()).to_boolean());
    }

    #[test]
    fn test_number_conversion() {
        let doc = doc();
        assert_eq!(Value::Boolean(true).to_number(&doc), 1.0);
        assert_eq!(Value::String(" 42 ".to_string()).to_number(&doc), 42.0);
        assert_eq!(Value::String("-.5".to_string()).to_number(&doc), -0.5);
        assert!(Value::String("abc".to_string()).to_number(&doc).is_nan());
        assert!(Value::String("1e3".to_string()).to_number(&doc).is_nan());
        assert!(Value::String("inf".to_string()).to_number(&doc).is_nan());
    }

    #[test]
    fn test_nodeset_converts_through_first_node() {
        let doc = doc();
        let root = doc.root_element().unwrap();
        let children: Vec<Position> = doc.children(root).collect();
        let value = Value::NodeSet(children);
        assert_eq!(value.to_string_value(&doc), "12");
        assert_eq!(value.to_number(&doc), 12.0);
        assert_eq!(Value::NodeSet(vec![]).to_string_value(&doc), "");
    }

    #[test]
    fn test_string_conversion() {
        let doc = doc();
        assert_eq!(Value::Boolean(false).to_string_value(&doc), "false");
        assert_eq!(Value::Number(42.0).to_string_value(&doc), "42");
        assert_eq!(Value::Number(3.25).to_string_value(&doc), "3.25");
        assert_eq!(Value::Number(f64::NAN).to_string_value(&doc), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string_value(&doc), "-Infinity");
    }
}
