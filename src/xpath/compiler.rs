//! XPath Expression Compiler
//!
//! Lowers a parsed expression into a flat list of stack operations,
//! resolving function names and namespace prefixes on the way. Every
//! check that can be made without a document is made here, so evaluation
//! itself cannot fail.

use super::functions::Function;
use super::namespaces::Namespaces;
use super::parser::{self, Axis, BinaryOp, Expr, NodeTest, Step};
use crate::document::{Document, NodeKind, Position};
use crate::error::{Error, Result};

/// Compiled expression: operations for a stack machine
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    pub ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Push the document node
    Root,
    /// Push the context node
    Context,
    /// Replace the node-set on top of the stack with the step's results
    Navigate(CompiledStep),
    /// Filter the node-set on top of the stack as a whole
    Filter(Box<CompiledExpr>),
    /// Merge the two node-sets on top of the stack
    Union,
    /// Keep only the nodes of the top node-set inside the context's subtree
    Scope,
    Number(f64),
    String(String),
    Call(Function, usize),
    Binary(BinaryOp),
    Negate,
}

/// A location step with its predicates, applied per context node
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStep {
    pub axis: Axis,
    pub test: CompiledNodeTest,
    pub predicates: Vec<CompiledExpr>,
}

/// Node test with prefixes resolved to namespace URIs
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledNodeTest {
    Any,
    Name(String),
    QName {
        qname: String,
        uri: String,
        local: String,
    },
    NamespaceWildcard {
        prefix: String,
        uri: String,
    },
    Node,
    Text,
    Comment,
    ProcessingInstruction(Option<String>),
}

impl CompiledNodeTest {
    /// Whether `pos`, reached along `axis`, passes the test
    pub(crate) fn matches(&self, doc: &Document, pos: Position, axis: Axis) -> bool {
        let principal = match axis {
            Axis::Attribute => matches!(pos, Position::Attribute { .. }),
            _ => matches!(pos, Position::Element(_)),
        };
        match self {
            CompiledNodeTest::Node => true,
            CompiledNodeTest::Text => matches!(doc.kind(pos), NodeKind::Text | NodeKind::CData),
            CompiledNodeTest::Comment => doc.kind(pos) == NodeKind::Comment,
            CompiledNodeTest::ProcessingInstruction(target) => {
                doc.kind(pos) == NodeKind::ProcessingInstructionName
                    && target.as_deref().map_or(true, |t| doc.name(pos) == Some(t))
            }
            CompiledNodeTest::Any => principal,
            CompiledNodeTest::Name(name) => principal && doc.name(pos) == Some(name.as_str()),
            CompiledNodeTest::QName { qname, uri, local } => {
                if !principal {
                    return false;
                }
                if doc.is_namespace_aware() {
                    doc.namespace_uri(pos) == Some(uri.as_str())
                        && doc.name(pos).map(local_part) == Some(local.as_str())
                } else {
                    doc.name(pos) == Some(qname.as_str())
                }
            }
            CompiledNodeTest::NamespaceWildcard { prefix, uri } => {
                if !principal {
                    return false;
                }
                if doc.is_namespace_aware() {
                    doc.namespace_uri(pos) == Some(uri.as_str())
                } else {
                    doc.name(pos)
                        .and_then(|name| name.split_once(':'))
                        .is_some_and(|(p, _)| p == prefix.as_str())
                }
            }
        }
    }
}

fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// A compiled top-level path expression
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPath {
    pub source: String,
    pub expr: CompiledExpr,
    /// Not restricted to the context's subtree as a whole: the path starts
    /// from `/`, or it is a union whose relative branches carry their own
    /// [`Op::Scope`]
    pub absolute: bool,
    /// Only downward steps and no whole-set filters at the top level, so
    /// intermediate results can be pruned to the context's region
    pub downward: bool,
}

impl CompiledPath {
    /// The final location step when the path ends in one
    pub fn final_step(&self) -> Option<&CompiledStep> {
        match self.expr.ops.last() {
            Some(Op::Navigate(step)) => Some(step),
            _ => None,
        }
    }
}

/// Parse and compile `source` against `namespaces`
pub fn compile(source: &str, namespaces: &Namespaces) -> Result<CompiledPath> {
    let expr = parser::parse(source).map_err(|message| Error::path_syntax(source, message))?;
    let compiler = Compiler { source, namespaces };

    if !yields_nodes(&expr) {
        return Err(Error::path_syntax(source, "expression does not select nodes"));
    }
    let mut ops = Vec::new();
    let mixed = expr.mixes_scopes();
    if mixed {
        compiler.compile_scoped(&expr, &mut ops)?;
    } else {
        compiler.compile_expr(&expr, &mut ops)?;
    }

    let downward = ops.iter().all(|op| match op {
        Op::Navigate(step) => step.axis.is_downward(),
        Op::Filter(_) => false,
        _ => true,
    });
    Ok(CompiledPath {
        source: source.to_string(),
        expr: CompiledExpr { ops },
        absolute: mixed || expr.is_absolute(),
        downward,
    })
}

/// Whether an expression statically evaluates to a node-set
fn yields_nodes(expr: &Expr) -> bool {
    match expr {
        Expr::Root { .. } | Expr::Step(_) | Expr::Path(..) => true,
        Expr::Filter(base, _) => yields_nodes(base),
        Expr::Union(left, right) => yields_nodes(left) && yields_nodes(right),
        _ => false,
    }
}

struct Compiler<'a> {
    source: &'a str,
    namespaces: &'a Namespaces,
}

impl Compiler<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::path_syntax(self.source, message)
    }

    fn compile_sub(&self, expr: &Expr) -> Result<CompiledExpr> {
        let mut ops = Vec::new();
        self.compile_expr(expr, &mut ops)?;
        Ok(CompiledExpr { ops })
    }

    /// Compile a union with absolute and relative branches, scoping each
    /// relative branch to the context before the branches are merged
    fn compile_scoped(&self, expr: &Expr, ops: &mut Vec<Op>) -> Result<()> {
        match expr {
            Expr::Union(left, right) => {
                if !yields_nodes(left) || !yields_nodes(right) {
                    return Err(self.error("`|` needs node-set operands"));
                }
                self.compile_scoped(left, ops)?;
                self.compile_scoped(right, ops)?;
                ops.push(Op::Union);
            }
            Expr::Path(base, step) if base.mixes_scopes() => {
                if !yields_nodes(base) {
                    return Err(self.error("location step applied to a non-node-set"));
                }
                self.compile_scoped(base, ops)?;
                ops.push(Op::Navigate(self.compile_step(step)?));
            }
            Expr::Filter(base, predicate) if base.mixes_scopes() => {
                self.compile_scoped(base, ops)?;
                ops.push(Op::Filter(Box::new(self.compile_sub(predicate)?)));
            }
            _ if expr.is_absolute() => self.compile_expr(expr, ops)?,
            _ => {
                self.compile_expr(expr, ops)?;
                ops.push(Op::Scope);
            }
        }
        Ok(())
    }

    fn compile_expr(&self, expr: &Expr, ops: &mut Vec<Op>) -> Result<()> {
        match expr {
            Expr::Root { .. } => ops.push(Op::Root),
            Expr::Number(n) => ops.push(Op::Number(*n)),
            Expr::String(s) => ops.push(Op::String(s.clone())),
            Expr::Step(step) => {
                ops.push(Op::Context);
                ops.push(Op::Navigate(self.compile_step(step)?));
            }
            Expr::Path(base, step) => {
                if !yields_nodes(base) {
                    return Err(self.error("location step applied to a non-node-set"));
                }
                self.compile_expr(base, ops)?;
                ops.push(Op::Navigate(self.compile_step(step)?));
            }
            Expr::Filter(base, predicate) => {
                if !yields_nodes(base) {
                    return Err(self.error("predicate applied to a non-node-set"));
                }
                self.compile_expr(base, ops)?;
                ops.push(Op::Filter(Box::new(self.compile_sub(predicate)?)));
            }
            Expr::Union(left, right) => {
                if !yields_nodes(left) || !yields_nodes(right) {
                    return Err(self.error("`|` needs node-set operands"));
                }
                self.compile_expr(left, ops)?;
                self.compile_expr(right, ops)?;
                ops.push(Op::Union);
            }
            Expr::Function(name, args) => {
                let function = self.resolve_function(name, args)?;
                for arg in args {
                    self.compile_expr(arg, ops)?;
                }
                ops.push(Op::Call(function, args.len()));
            }
            Expr::Binary(left, op, right) => {
                self.compile_expr(left, ops)?;
                self.compile_expr(right, ops)?;
                ops.push(Op::Binary(*op));
            }
            Expr::Negate(inner) => {
                self.compile_expr(inner, ops)?;
                ops.push(Op::Negate);
            }
        }
        Ok(())
    }

    fn resolve_function(&self, name: &str, args: &[Expr]) -> Result<Function> {
        let function = Function::from_name(name)
            .ok_or_else(|| self.error(format!("unknown function `{name}()`")))?;
        let (min, max) = function.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            let expected = match max {
                Some(max) if max == min => format!("{min}"),
                Some(max) => format!("{min} to {max}"),
                None => format!("at least {min}"),
            };
            return Err(self.error(format!(
                "`{name}()` takes {expected} argument(s), got {}",
                args.len()
            )));
        }
        if function.takes_nodesets() && !args.iter().all(yields_nodes) {
            return Err(self.error(format!("`{name}()` needs a node-set argument")));
        }
        Ok(function)
    }

    fn compile_step(&self, step: &Step) -> Result<CompiledStep> {
        let predicates = step
            .predicates
            .iter()
            .map(|p| self.compile_sub(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledStep {
            axis: step.axis,
            test: self.compile_node_test(&step.node_test)?,
            predicates,
        })
    }

    fn compile_node_test(&self, test: &NodeTest) -> Result<CompiledNodeTest> {
        let compiled = match test {
            NodeTest::Any => CompiledNodeTest::Any,
            NodeTest::Name(name) => CompiledNodeTest::Name(name.clone()),
            NodeTest::QName(prefix, local) => CompiledNodeTest::QName {
                qname: format!("{prefix}:{local}"),
                uri: self.resolve_prefix(prefix)?,
                local: local.clone(),
            },
            NodeTest::NamespaceWildcard(prefix) => CompiledNodeTest::NamespaceWildcard {
                prefix: prefix.clone(),
                uri: self.resolve_prefix(prefix)?,
            },
            NodeTest::Node => CompiledNodeTest::Node,
            NodeTest::Text => CompiledNodeTest::Text,
            NodeTest::Comment => CompiledNodeTest::Comment,
            NodeTest::ProcessingInstruction(target) => {
                CompiledNodeTest::ProcessingInstruction(target.clone())
            }
        };
        Ok(compiled)
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String> {
        self.namespaces
            .get(prefix)
            .map(str::to_string)
            .ok_or_else(|| Error::UnboundNamespacePrefix {
                prefix: prefix.to_string(),
                expr: self.source.to_string(),
            })
    }
}
