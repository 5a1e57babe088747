//! Prefix bindings for path expressions

use std::collections::BTreeMap;

use crate::index::namespace::ns;

/// Prefix → namespace URI bindings used to resolve prefixed name tests.
/// The `xml` prefix is always bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Namespaces {
    bindings: BTreeMap<String, String>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.insert(prefix, uri);
        self
    }

    /// Bind `prefix`, returning the URI it was previously bound to
    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Option<String> {
        self.bindings.insert(prefix.into(), uri.into())
    }

    /// URI bound to `prefix`
    pub fn get(&self, prefix: &str) -> Option<&str> {
        match self.bindings.get(prefix) {
            Some(uri) => Some(uri),
            None if prefix == "xml" => Some(ns::XML),
            None => None,
        }
    }

    /// Explicit bindings in prefix order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<P: Into<String>, U: Into<String>> FromIterator<(P, U)> for Namespaces {
    fn from_iter<I: IntoIterator<Item = (P, U)>>(iter: I) -> Self {
        let mut namespaces = Namespaces::new();
        for (prefix, uri) in iter {
            namespaces.insert(prefix, uri);
        }
        namespaces
    }
}
