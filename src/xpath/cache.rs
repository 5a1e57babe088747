//! Per-thread cache of compiled expressions
//!
//! Keyed by expression text and namespace bindings. Only successful
//! compilations are stored.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::compiler::{compile, CompiledPath};
use super::namespaces::Namespaces;
use crate::config::Config;
use crate::error::Result;

type Key = (String, Namespaces);

thread_local! {
    static CACHE: RefCell<Option<LruCache<Key, Arc<CompiledPath>>>> =
        RefCell::new(NonZeroUsize::new(Config::global().expr_cache).map(LruCache::new));
}

/// Compile `expr`, reusing an earlier compilation on this thread
pub(crate) fn compiled(expr: &str, namespaces: &Namespaces) -> Result<Arc<CompiledPath>> {
    CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let Some(cache) = cache.as_mut() else {
            return compile(expr, namespaces).map(Arc::new);
        };

        let key = (expr.to_string(), namespaces.clone());
        if let Some(path) = cache.get(&key) {
            tracing::trace!(target: "xmlnav::xpath", expr, "expression cache hit");
            return Ok(Arc::clone(path));
        }

        tracing::trace!(target: "xmlnav::xpath", expr, "expression cache miss");
        let path = Arc::new(compile(expr, namespaces)?);
        cache.put(key, Arc::clone(&path));
        Ok(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuses_compilation() {
        let namespaces = Namespaces::new();
        let first = compiled("//cached/path", &namespaces).unwrap();
        let second = compiled("//cached/path", &namespaces).unwrap();
        if Config::global().expr_cache > 0 {
            assert!(Arc::ptr_eq(&first, &second));
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_bindings_are_part_of_the_key() {
        let a = compiled("//p:x", &Namespaces::new().with("p", "urn:a")).unwrap();
        let b = compiled("//p:x", &Namespaces::new().with("p", "urn:b")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let namespaces = Namespaces::new();
        assert!(compiled("//p:x", &namespaces).is_err());
        assert!(compiled("//p:x", &namespaces).is_err());
        assert!(compiled("//p:x", &namespaces.clone().with("p", "urn:p")).is_ok());
    }
}
