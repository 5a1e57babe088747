//! Lazy match sequences
//!
//! Everything before the final location step is evaluated eagerly into a
//! document-ordered node set. The final step then either streams, one
//! context node at a time, or is buffered and sorted when streaming could
//! break document order.

use std::iter::FusedIterator;
use std::sync::Arc;

use super::axes::Walk;
use super::compiler::{CompiledPath, CompiledStep};
use super::eval::{self, EvalContext, Region};
use crate::cursor::Cursor;
use crate::document::{Document, Position};

/// Matches of one path evaluation, in document order. Each item is an
/// independent cursor; the context cursor is never moved.
pub struct Matches {
    doc: Document,
    source: Source,
}

enum Source {
    Buffered(std::vec::IntoIter<Position>),
    Streaming(Box<Stream>),
    Done,
}

/// Final-step state: contexts left to visit and the walk in progress
struct Stream {
    path: Arc<CompiledPath>,
    contexts: std::vec::IntoIter<Position>,
    walk: Option<Walk>,
    /// Results of a context whose predicates needed the whole axis
    pending: std::vec::IntoIter<Position>,
    scope: Option<Position>,
    region: Option<Region>,
}

impl Matches {
    pub(crate) fn new(context: &Cursor, path: Arc<CompiledPath>) -> Self {
        let doc = context.document().clone();
        let node = match context.pos() {
            Position::Attribute { element, .. } => Position::Element(element),
            pos => pos,
        };
        let scope = match node {
            _ if path.absolute => None,
            Position::Document => None,
            node => Some(node),
        };
        let region = scope
            .filter(|_| path.downward)
            .map(|scope| Region::new(&doc, scope));
        let ctx = EvalContext::new(&doc, node);

        let source = match path.expr.ops.split_last() {
            Some((_, prefix)) if path.final_step().is_some() => {
                let contexts = eval::run(prefix, &ctx, region.as_ref()).into_nodeset();
                match path.final_step() {
                    Some(step) if step.axis.is_downward() && eval::pairwise_disjoint(&doc, &contexts) => {
                        tracing::trace!(
                            target: "xmlnav::xpath",
                            expr = %path.source,
                            contexts = contexts.len(),
                            "streaming final step"
                        );
                        Source::Streaming(Box::new(Stream {
                            path: Arc::clone(&path),
                            contexts: contexts.into_iter(),
                            walk: None,
                            pending: Vec::new().into_iter(),
                            scope,
                            region,
                        }))
                    }
                    Some(step) => {
                        tracing::trace!(
                            target: "xmlnav::xpath",
                            expr = %path.source,
                            contexts = contexts.len(),
                            "buffering final step"
                        );
                        let nodes = eval::navigate(&doc, &contexts, step, region.as_ref());
                        Source::Buffered(restrict(&doc, nodes, scope).into_iter())
                    }
                    None => Source::Done,
                }
            }
            _ => {
                tracing::trace!(target: "xmlnav::xpath", expr = %path.source, "buffering expression");
                let nodes = eval::run(&path.expr.ops, &ctx, region.as_ref()).into_nodeset();
                Source::Buffered(restrict(&doc, nodes, scope).into_iter())
            }
        };

        Matches { doc, source }
    }
}

/// Keep only nodes inside the scope's subtree
fn restrict(doc: &Document, mut nodes: Vec<Position>, scope: Option<Position>) -> Vec<Position> {
    if let Some(scope) = scope {
        nodes.retain(|&pos| doc.is_in_subtree(scope, pos));
    }
    nodes
}

impl Stream {
    fn in_scope(&self, doc: &Document, pos: Position) -> bool {
        self.scope.map_or(true, |scope| doc.is_in_subtree(scope, pos))
    }

    fn next(&mut self, doc: &Document) -> Option<Position> {
        let path = Arc::clone(&self.path);
        let step = path.final_step()?;

        loop {
            if let Some(pos) = self.pending.next() {
                if self.in_scope(doc, pos) {
                    return Some(pos);
                }
                continue;
            }

            if let Some(walk) = self.walk.as_mut() {
                match walk.next(doc) {
                    Some(pos) => {
                        if step.test.matches(doc, pos, step.axis) && self.in_scope(doc, pos) {
                            return Some(pos);
                        }
                        continue;
                    }
                    None => self.walk = None,
                }
            }

            let context = self.contexts.next()?;
            self.start_context(doc, context, step);
        }
    }

    fn start_context(&mut self, doc: &Document, context: Position, step: &CompiledStep) {
        if !step.predicates.is_empty() {
            self.pending = eval::step_from(doc, context, step, self.region.as_ref()).into_iter();
            return;
        }
        // Above the scope only the scope's own subtree can match
        let walk = match &self.region {
            Some(region) if region.restricts(context, step) => Walk::descendants_or_self(region.scope()),
            _ => Walk::new(doc, context, step.axis),
        };
        self.walk = Some(walk);
    }
}

impl Iterator for Matches {
    type Item = Cursor;

    fn next(&mut self) -> Option<Cursor> {
        let next = match &mut self.source {
            Source::Buffered(nodes) => nodes.next(),
            Source::Streaming(stream) => stream.next(&self.doc),
            Source::Done => None,
        };
        match next {
            Some(pos) => Some(Cursor::new(self.doc.clone(), pos)),
            None => {
                self.source = Source::Done;
                None
            }
        }
    }
}

impl FusedIterator for Matches {}

impl std::fmt::Debug for Matches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.source {
            Source::Buffered(_) => "buffered",
            Source::Streaming(_) => "streaming",
            Source::Done => "done",
        };
        f.debug_struct("Matches").field("mode", &mode).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::compiler::compile;
    use crate::xpath::Namespaces;

    const XML: &str = "<D><Org><E><Name>Alice</Name></E><E/></Org><Org><E><Name>Bob</Name></E></Org></D>";

    fn matches(context: &Cursor, expr: &str) -> Matches {
        let path = compile(expr, &Namespaces::new()).unwrap();
        Matches::new(context, Arc::new(path))
    }

    fn mode(m: &Matches) -> &'static str {
        match m.source {
            Source::Buffered(_) => "buffered",
            Source::Streaming(_) => "streaming",
            Source::Done => "done",
        }
    }

    #[test]
    fn test_streaming_selection() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        assert_eq!(mode(&matches(&root, "//Name")), "streaming");
        assert_eq!(mode(&matches(&root, "Org/E")), "streaming");
        assert_eq!(mode(&matches(&root, "//E/..")), "buffered");
        assert_eq!(mode(&matches(&root, "//E | //Org")), "buffered");
    }

    #[test]
    fn test_scoped_descendants() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let second_org = matches(&root, "Org").nth(1).unwrap();
        let names: Vec<Cursor> = matches(&second_org, "//Name").collect();
        assert_eq!(names.len(), 1);
        assert!(second_org.fragment().strictly_contains(names[0].fragment().offset));
    }

    #[test]
    fn test_nested_contexts_are_buffered_in_order() {
        let doc = Document::parse("<a><a><a/></a><a/></a>", false).unwrap();
        let root = doc.root_cursor();
        let found = matches(&root, "//a/descendant-or-self::a");
        assert_eq!(mode(&found), "buffered");
        let offsets: Vec<usize> = found.map(|c| c.fragment().offset).collect();
        assert_eq!(offsets, vec![0, 3, 6, 14]);
    }

    #[test]
    fn test_fused_after_end() {
        let root = Document::parse(XML, false).unwrap().root_cursor();
        let mut found = matches(&root, "//Name");
        assert!(found.next().is_some());
        assert!(found.next().is_some());
        assert!(found.next().is_none());
        assert!(found.next().is_none());
        assert_eq!(mode(&found), "done");
    }

    #[test]
    fn test_attribute_context_uses_owner() {
        let doc = Document::parse("<r><e k=\"v\"><c/></e></r>", false).unwrap();
        let root = doc.root_cursor();
        let attr = matches(&root, "e/@k").next().unwrap();
        let children: Vec<Cursor> = matches(&attr, "c").collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), Some("c"));
    }
}
