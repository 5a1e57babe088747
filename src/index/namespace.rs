//! Namespace Resolution
//!
//! Stack-based namespace resolver used while building the index of a
//! namespace-aware document, plus the document's explicit namespace table.

use super::element::NO_NAMESPACE;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
}

/// Interned namespace URIs and every `xmlns` declaration seen, in document order
#[derive(Debug, Default, Clone)]
pub struct NamespaceTable {
    uris: Vec<Box<str>>,
    declarations: Vec<(Box<str>, u32)>,
}

impl NamespaceTable {
    /// Intern a URI and return its id
    pub fn intern(&mut self, uri: &str) -> u32 {
        if let Some(pos) = self.uris.iter().position(|u| &**u == uri) {
            return pos as u32;
        }
        self.uris.push(uri.into());
        (self.uris.len() - 1) as u32
    }

    /// Look up an interned URI
    pub fn uri(&self, id: u32) -> Option<&str> {
        if id == NO_NAMESPACE {
            return None;
        }
        self.uris.get(id as usize).map(|u| &**u)
    }

    /// Record a declaration; the empty prefix is the default namespace
    pub fn record(&mut self, prefix: &str, uri_id: u32) {
        self.declarations.push((prefix.into(), uri_id));
    }

    /// `(prefix, uri)` pairs in document order, `""` for the default namespace
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.declarations
            .iter()
            .map(|(p, id)| (&**p, self.uri(*id).unwrap_or("")))
    }

    /// Number of distinct URIs
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.uris.shrink_to_fit();
        self.declarations.shrink_to_fit();
    }
}

/// Namespace binding (prefix -> URI id)
#[derive(Debug, Clone)]
struct NsBinding<'a> {
    prefix: &'a [u8],
    uri: u32,
    depth: u32,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver<'a> {
    bindings: Vec<NsBinding<'a>>,
    depth: u32,
}

impl<'a> NamespaceResolver<'a> {
    /// Create a resolver with the `xml` prefix pre-bound
    pub fn new(table: &mut NamespaceTable) -> Self {
        let xml = table.intern(ns::XML);
        NamespaceResolver {
            bindings: vec![NsBinding {
                prefix: b"xml",
                uri: xml,
                depth: 0,
            }],
            depth: 0,
        }
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a binding in the current scope. An empty prefix declares the
    /// default namespace; `NO_NAMESPACE` undeclares it (`xmlns=""`).
    pub fn declare(&mut self, prefix: &'a [u8], uri: u32) {
        if prefix == b"xml" || prefix == b"xmlns" {
            return;
        }
        self.bindings.push(NsBinding {
            prefix,
            uri,
            depth: self.depth,
        });
    }

    /// Resolve a prefix; `None` when it was never declared
    pub fn resolve(&self, prefix: &[u8]) -> Option<u32> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri)
    }

    /// Resolve the default namespace, NO_NAMESPACE when none is in scope
    pub fn resolve_default(&self) -> u32 {
        self.resolve(b"").unwrap_or(NO_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_prefix_prebound() {
        let mut table = NamespaceTable::default();
        let resolver = NamespaceResolver::new(&mut table);
        let id = resolver.resolve(b"xml").unwrap();
        assert_eq!(table.uri(id), Some(ns::XML));
    }

    #[test]
    fn test_scoped_bindings() {
        let mut table = NamespaceTable::default();
        let mut resolver = NamespaceResolver::new(&mut table);
        let a = table.intern("urn:a");
        let b = table.intern("urn:b");

        resolver.push_scope();
        resolver.declare(b"p", a);
        resolver.push_scope();
        resolver.declare(b"p", b);
        assert_eq!(resolver.resolve(b"p"), Some(b));
        resolver.pop_scope();
        assert_eq!(resolver.resolve(b"p"), Some(a));
        resolver.pop_scope();
        assert_eq!(resolver.resolve(b"p"), None);
    }

    #[test]
    fn test_default_namespace_undeclare() {
        let mut table = NamespaceTable::default();
        let mut resolver = NamespaceResolver::new(&mut table);
        let a = table.intern("urn:a");

        resolver.push_scope();
        resolver.declare(b"", a);
        assert_eq!(resolver.resolve_default(), a);
        resolver.push_scope();
        resolver.declare(b"", NO_NAMESPACE);
        assert_eq!(resolver.resolve_default(), NO_NAMESPACE);
    }

    #[test]
    fn test_intern_dedups() {
        let mut table = NamespaceTable::default();
        let a = table.intern("urn:a");
        assert_eq!(table.intern("urn:a"), a);
        assert_eq!(table.len(), 1);
        assert_eq!(table.uri(NO_NAMESPACE), None);
    }
}
