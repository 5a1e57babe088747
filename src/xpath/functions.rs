//! XPath 1.0 Functions
//!
//! The supported core subset:
//!
//! Node Set Functions:
//! - position(), last(), count(), name(), local-name()
//!
//! String Functions:
//! - string(), concat(), starts-with(), contains(), string-length(),
//!   normalize-space()
//!
//! Boolean Functions:
//! - boolean(), not(), true(), false()
//!
//! Number Functions:
//! - number()
//!
//! Names and argument counts are checked when an expression is compiled,
//! so a call that reaches [`Function::call`] is always well-formed.

use super::eval::EvalContext;
use super::value::{parse_number, Value};
use crate::document::Position;
use crate::extract::normalize;

/// A resolved function reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Position,
    Last,
    Count,
    Name,
    LocalName,
    String,
    Concat,
    StartsWith,
    Contains,
    StringLength,
    NormalizeSpace,
    Boolean,
    Not,
    True,
    False,
    Number,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let f = match name {
            "position" => Function::Position,
            "last" => Function::Last,
            "count" => Function::Count,
            "name" => Function::Name,
            "local-name" => Function::LocalName,
            "string" => Function::String,
            "concat" => Function::Concat,
            "starts-with" => Function::StartsWith,
            "contains" => Function::Contains,
            "string-length" => Function::StringLength,
            "normalize-space" => Function::NormalizeSpace,
            "boolean" => Function::Boolean,
            "not" => Function::Not,
            "true" => Function::True,
            "false" => Function::False,
            "number" => Function::Number,
            _ => return None,
        };
        Some(f)
    }

    /// Minimum and maximum argument count; `None` is unbounded
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Function::Position | Function::Last | Function::True | Function::False => (0, Some(0)),
            Function::Count | Function::Boolean | Function::Not => (1, Some(1)),
            Function::Name
            | Function::LocalName
            | Function::String
            | Function::StringLength
            | Function::NormalizeSpace
            | Function::Number => (0, Some(1)),
            Function::StartsWith | Function::Contains => (2, Some(2)),
            Function::Concat => (2, None),
        }
    }

    /// Whether every argument must be a node-set
    pub fn takes_nodesets(self) -> bool {
        matches!(self, Function::Count | Function::Name | Function::LocalName)
    }

    /// Evaluate with already-evaluated arguments
    pub(crate) fn call(self, args: Vec<Value>, ctx: &EvalContext<'_>) -> Value {
        let doc = ctx.doc;
        let mut args = args.into_iter();
        // Optional single argument defaulting to the context node
        let arg_or_context = |args: &mut std::vec::IntoIter<Value>| {
            args.next().unwrap_or_else(|| Value::NodeSet(vec![ctx.node]))
        };

        match self {
            Function::Position => Value::Number(ctx.position as f64),
            Function::Last => Value::Number(ctx.size as f64),
            Function::Count => {
                let count = args.next().map_or(0, |v| v.into_nodeset().len());
                Value::Number(count as f64)
            }
            Function::Name => {
                let nodes = arg_or_context(&mut args).into_nodeset();
                let name = nodes.first().and_then(|&pos| node_name(ctx, pos));
                Value::String(name.unwrap_or_default().to_string())
            }
            Function::LocalName => {
                let nodes = arg_or_context(&mut args).into_nodeset();
                let name = nodes.first().and_then(|&pos| node_name(ctx, pos)).unwrap_or_default();
                Value::String(local_part(name).to_string())
            }
            Function::String => Value::String(arg_or_context(&mut args).to_string_value(doc)),
            Function::Concat => {
                let joined: String = args.map(|v| v.to_string_value(doc)).collect();
                Value::String(joined)
            }
            Function::StartsWith | Function::Contains => {
                let haystack = args.next().map(|v| v.to_string_value(doc)).unwrap_or_default();
                let needle = args.next().map(|v| v.to_string_value(doc)).unwrap_or_default();
                Value::Boolean(if self == Function::StartsWith {
                    haystack.starts_with(&needle)
                } else {
                    haystack.contains(&needle)
                })
            }
            Function::StringLength => {
                let s = arg_or_context(&mut args).to_string_value(doc);
                Value::Number(s.chars().count() as f64)
            }
            Function::NormalizeSpace => {
                let s = arg_or_context(&mut args).to_string_value(doc);
                Value::String(normalize(&s))
            }
            Function::Boolean => Value::Boolean(args.next().is_some_and(|v| v.to_boolean())),
            Function::Not => Value::Boolean(!args.next().is_some_and(|v| v.to_boolean())),
            Function::True => Value::Boolean(true),
            Function::False => Value::Boolean(false),
            Function::Number => match arg_or_context(&mut args) {
                Value::String(s) => Value::Number(parse_number(&s)),
                other => Value::Number(other.to_number(doc)),
            },
        }
    }
}

/// Expanded-name text of an element, attribute or PI; empty otherwise
fn node_name<'d>(ctx: &EvalContext<'d>, pos: Position) -> Option<&'d str> {
    ctx.doc.name(pos)
}

fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    fn with_context<R>(f: impl FnOnce(&EvalContext<'_>) -> R) -> R {
        let doc = Document::parse("<x:r xmlns:x=\"urn:x\"> a  b </x:r>", true).unwrap();
        let node = doc.root_element().unwrap();
        let ctx = EvalContext {
            doc: &doc,
            node,
            position: 2,
            size: 5,
        };
        f(&ctx)
    }

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn test_lookup_and_arity() {
        assert_eq!(Function::from_name("starts-with"), Some(Function::StartsWith));
        assert_eq!(Function::from_name("substring"), None);
        assert_eq!(Function::Concat.arity(), (2, None));
        assert_eq!(Function::Name.arity(), (0, Some(1)));
        assert!(Function::Count.takes_nodesets());
        assert!(!Function::Contains.takes_nodesets());
    }

    #[test]
    fn test_context_functions() {
        with_context(|ctx| {
            assert_eq!(Function::Position.call(vec![], ctx), Value::Number(2.0));
            assert_eq!(Function::Last.call(vec![], ctx), Value::Number(5.0));
            assert_eq!(Function::Name.call(vec![], ctx), s("x:r"));
            assert_eq!(Function::LocalName.call(vec![], ctx), s("r"));
            assert_eq!(Function::String.call(vec![], ctx), s(" a  b "));
            assert_eq!(Function::NormalizeSpace.call(vec![], ctx), s("a b"));
            assert_eq!(Function::StringLength.call(vec![], ctx), Value::Number(6.0));
        });
    }

    #[test]
    fn test_string_functions() {
        with_context(|ctx| {
            assert_eq!(Function::Concat.call(vec![s("a"), Value::Number(1.0), s("b")], ctx), s("a1b"));
            assert_eq!(Function::Contains.call(vec![s("hello"), s("ell")], ctx), Value::Boolean(true));
            assert_eq!(Function::StartsWith.call(vec![s("hello"), s("ell")], ctx), Value::Boolean(false));
            assert_eq!(Function::Number.call(vec![s(" 7 ")], ctx), Value::Number(7.0));
        });
    }

    #[test]
    fn test_boolean_functions() {
        with_context(|ctx| {
            assert_eq!(Function::Not.call(vec![Value::NodeSet(vec![])], ctx), Value::Boolean(true));
            assert_eq!(Function::Boolean.call(vec![s("x")], ctx), Value::Boolean(true));
            assert_eq!(Function::Count.call(vec![Value::NodeSet(vec![Position::Document])], ctx), Value::Number(1.0));
            assert_eq!(Function::Name.call(vec![Value::NodeSet(vec![])], ctx), s(""));
        });
    }
}
