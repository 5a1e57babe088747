//! XPath Evaluator
//!
//! Stack-based evaluation of compiled expressions. Location-step
//! predicates are applied per context node over that node's axis results;
//! a predicate on a parenthesised expression filters the whole node-set.

use super::axes::{self, Walk};
use super::compiler::{CompiledExpr, CompiledStep, Op};
use super::parser::{Axis, BinaryOp};
use super::value::Value;
use crate::document::{Document, Position};

/// Evaluation context for one node
#[derive(Clone, Copy)]
pub(crate) struct EvalContext<'d> {
    pub doc: &'d Document,
    pub node: Position,
    /// 1-based proximity position
    pub position: usize,
    pub size: usize,
}

impl<'d> EvalContext<'d> {
    pub fn new(doc: &'d Document, node: Position) -> Self {
        EvalContext {
            doc,
            node,
            position: 1,
            size: 1,
        }
    }
}

/// Nodes a scoped query may pass through: the ancestors of the scope node
/// and the scope's own subtree. Anything else can never lead back into the
/// subtree along downward axes.
#[derive(Debug)]
pub(crate) struct Region {
    scope: Position,
    /// Ancestors of `scope`, document node first
    chain: Vec<Position>,
}

impl Region {
    pub fn new(doc: &Document, scope: Position) -> Self {
        let mut chain = axes::ancestors(doc, scope);
        chain.reverse();
        Region { scope, chain }
    }

    pub fn scope(&self) -> Position {
        self.scope
    }

    /// Strict ancestor of the scope node
    pub fn is_above(&self, pos: Position) -> bool {
        self.chain.contains(&pos)
    }

    pub fn contains(&self, doc: &Document, pos: Position) -> bool {
        self.is_above(pos) || doc.is_in_subtree(self.scope, pos)
    }

    /// The part of `above`'s descendant axis that lies inside the region,
    /// in document order
    fn restricted_descendants(&self, doc: &Document, above: Position, include_self: bool) -> Vec<Position> {
        let below = match self.chain.iter().position(|&p| p == above) {
            Some(i) => &self.chain[i + 1..],
            None => &[],
        };
        let mut result = Vec::new();
        if include_self {
            result.push(above);
        }
        result.extend_from_slice(below);
        result.extend(Walk::descendants_or_self(self.scope).collect_all(doc));
        result
    }

    /// Whether a step from `context` can be limited to the region up front
    pub fn restricts(&self, context: Position, step: &CompiledStep) -> bool {
        step.predicates.is_empty()
            && matches!(step.axis, Axis::Descendant | Axis::DescendantOrSelf)
            && self.is_above(context)
    }
}

/// Evaluate a compiled expression for one context node
pub(crate) fn evaluate(expr: &CompiledExpr, ctx: &EvalContext<'_>) -> Value {
    run(&expr.ops, ctx, None)
}

/// Run operations on an empty stack. With a region, every location step
/// result is pruned to it.
pub(crate) fn run(ops: &[Op], ctx: &EvalContext<'_>, region: Option<&Region>) -> Value {
    let doc = ctx.doc;
    let mut stack: Vec<Value> = Vec::with_capacity(4);

    for op in ops {
        match op {
            Op::Root => stack.push(Value::NodeSet(vec![Position::Document])),
            Op::Context => stack.push(Value::NodeSet(vec![ctx.node])),
            Op::Navigate(step) => {
                let contexts = pop(&mut stack).into_nodeset();
                stack.push(Value::NodeSet(navigate(doc, &contexts, step, region)));
            }
            Op::Filter(predicate) => {
                let nodes = pop(&mut stack).into_nodeset();
                let kept = apply_predicates(doc, nodes, std::slice::from_ref(predicate.as_ref()));
                stack.push(Value::NodeSet(kept));
            }
            Op::Union => {
                let right = pop(&mut stack).into_nodeset();
                let mut left = pop(&mut stack).into_nodeset();
                left.extend(right);
                sort_unique(doc, &mut left);
                stack.push(Value::NodeSet(left));
            }
            Op::Scope => {
                let mut nodes = pop(&mut stack).into_nodeset();
                nodes.retain(|&pos| doc.is_in_subtree(ctx.node, pos));
                stack.push(Value::NodeSet(nodes));
            }
            Op::Number(n) => stack.push(Value::Number(*n)),
            Op::String(s) => stack.push(Value::String(s.clone())),
            Op::Call(function, argc) => {
                let args = stack.split_off(stack.len().saturating_sub(*argc));
                stack.push(function.call(args, ctx));
            }
            Op::Binary(op) => {
                let right = pop(&mut stack);
                let left = pop(&mut stack);
                stack.push(binary(doc, *op, left, right));
            }
            Op::Negate => {
                let value = pop(&mut stack);
                stack.push(Value::Number(-value.to_number(doc)));
            }
        }
    }

    pop(&mut stack)
}

fn pop(stack: &mut Vec<Value>) -> Value {
    stack.pop().unwrap_or(Value::NodeSet(Vec::new()))
}

/// Apply one step to every context node; the result is in document order
pub(crate) fn navigate(
    doc: &Document,
    contexts: &[Position],
    step: &CompiledStep,
    region: Option<&Region>,
) -> Vec<Position> {
    let mut result = Vec::new();
    for &context in contexts {
        result.extend(step_from(doc, context, step, region));
    }
    if let Some(region) = region {
        result.retain(|&pos| region.contains(doc, pos));
    }
    if contexts.len() > 1 || step.axis.is_reverse() {
        sort_unique(doc, &mut result);
    }
    result
}

/// Results of one step from one context node, in axis order
pub(crate) fn step_from(
    doc: &Document,
    context: Position,
    step: &CompiledStep,
    region: Option<&Region>,
) -> Vec<Position> {
    let candidates = match region {
        Some(region) if region.restricts(context, step) => {
            region.restricted_descendants(doc, context, step.axis == Axis::DescendantOrSelf)
        }
        _ => axes::navigate(doc, context, step.axis),
    };
    let matched: Vec<Position> = candidates
        .into_iter()
        .filter(|&pos| step.test.matches(doc, pos, step.axis))
        .collect();
    apply_predicates(doc, matched, &step.predicates)
}

/// Filter `nodes` through each predicate in turn; positions count from 1
/// in the order given
pub(crate) fn apply_predicates(doc: &Document, mut nodes: Vec<Position>, predicates: &[CompiledExpr]) -> Vec<Position> {
    for predicate in predicates {
        let size = nodes.len();
        nodes = nodes
            .into_iter()
            .enumerate()
            .filter(|&(i, node)| {
                let ctx = EvalContext {
                    doc,
                    node,
                    position: i + 1,
                    size,
                };
                match evaluate(predicate, &ctx) {
                    Value::Number(n) => n == ctx.position as f64,
                    other => other.to_boolean(),
                }
            })
            .map(|(_, node)| node)
            .collect();
    }
    nodes
}

/// Sort into document order and drop duplicates
pub(crate) fn sort_unique(doc: &Document, nodes: &mut Vec<Position>) {
    nodes.sort_by_cached_key(|&pos| doc.order_key(pos));
    nodes.dedup();
}

/// Whether no node of a document-ordered set lies inside the subtree of
/// an earlier one
pub(crate) fn pairwise_disjoint(doc: &Document, nodes: &[Position]) -> bool {
    let mut reach: Option<u32> = None;
    for &pos in nodes {
        let (start, end) = subtree_range(doc, pos);
        if reach.is_some_and(|reach| start < reach) {
            return false;
        }
        reach = Some(reach.map_or(end, |reach| reach.max(end)));
    }
    true
}

/// Byte range covered by a node and everything below it; attributes are
/// empty ranges at their owner's start
fn subtree_range(doc: &Document, pos: Position) -> (u32, u32) {
    match pos {
        Position::Document => (0, doc.len() as u32),
        Position::Element(idx) => doc.element(idx).map_or((0, 0), |e| (e.extent.offset, e.extent.end())),
        Position::Attribute { element, .. } => {
            let start = doc.element(element).map_or(0, |e| e.extent.offset);
            (start, start)
        }
        Position::Text(idx) => doc.text_node(idx).map_or((0, 0), |t| {
            (t.span.offset, t.span.end().max(t.span.offset + 1))
        }),
    }
}

fn binary(doc: &Document, op: BinaryOp, left: Value, right: Value) -> Value {
    match op {
        BinaryOp::Or => Value::Boolean(left.to_boolean() || right.to_boolean()),
        BinaryOp::And => Value::Boolean(left.to_boolean() && right.to_boolean()),
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq => Value::Boolean(compare(doc, op, &left, &right)),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let l = left.to_number(doc);
            let r = right.to_number(doc);
            Value::Number(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                _ => l % r,
            })
        }
    }
}

/// XPath 1.0 comparison: node-sets compare existentially through the
/// string-values of their nodes
fn compare(doc: &Document, op: BinaryOp, left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::NodeSet(ln), Value::NodeSet(rn)) => {
            let right_strings: Vec<Value> = rn.iter().map(|&r| Value::String(doc.string_value(r))).collect();
            ln.iter().any(|&l| {
                let ls = Value::String(doc.string_value(l));
                right_strings.iter().any(|rs| compare_atomic(doc, op, &ls, rs))
            })
        }
        (Value::NodeSet(nodes), Value::Boolean(_)) | (Value::Boolean(_), Value::NodeSet(nodes)) => {
            let as_bool = Value::Boolean(!nodes.is_empty());
            if matches!(left, Value::NodeSet(_)) {
                compare_atomic(doc, op, &as_bool, right)
            } else {
                compare_atomic(doc, op, left, &as_bool)
            }
        }
        (Value::NodeSet(nodes), other) => nodes
            .iter()
            .any(|&n| compare_atomic(doc, op, &Value::String(doc.string_value(n)), other)),
        (other, Value::NodeSet(nodes)) => nodes
            .iter()
            .any(|&n| compare_atomic(doc, op, other, &Value::String(doc.string_value(n)))),
        _ => compare_atomic(doc, op, left, right),
    }
}

fn compare_atomic(doc: &Document, op: BinaryOp, left: &Value, right: &Value) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = match (left, right) {
                (Value::Boolean(_), _) | (_, Value::Boolean(_)) => left.to_boolean() == right.to_boolean(),
                (Value::Number(_), _) | (_, Value::Number(_)) => left.to_number(doc) == right.to_number(doc),
                _ => left.to_string_value(doc) == right.to_string_value(doc),
            };
            equal == (op == BinaryOp::Eq)
        }
        _ => {
            let l = left.to_number(doc);
            let r = right.to_number(doc);
            match op {
                BinaryOp::Lt => l < r,
                BinaryOp::LtEq => l <= r,
                BinaryOp::Gt => l > r,
                _ => l >= r,
            }
        }
    }
}
