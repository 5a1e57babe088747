//! Runtime configuration
//!
//! Parse options are passed explicitly. Process-wide tuning is read once
//! from the environment:
//!
//! | Variable | Effect | Default |
//! |----------|--------|---------|
//! | `XMLNAV_EXPR_CACHE` | per-thread compiled expression cache capacity, 0 disables | 128 |
//! | `XMLNAV_DEBUG_INDEX` | emit a sizing event after each index build | unset |

use std::sync::OnceLock;

/// Default capacity of the per-thread compiled expression cache
pub const DEFAULT_EXPR_CACHE: usize = 128;

/// Options for [`Document::parse_with`](crate::Document::parse_with)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Resolve `xmlns` declarations and reject unbound prefixes
    pub namespace_aware: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set namespace-aware parsing
    pub fn namespace_aware(mut self, yes: bool) -> Self {
        self.namespace_aware = yes;
        self
    }
}

/// Process-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the per-thread compiled expression cache
    pub expr_cache: usize,
    /// Emit detailed index sizing diagnostics
    pub debug_index: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expr_cache: DEFAULT_EXPR_CACHE,
            debug_index: false,
        }
    }
}

impl Config {
    /// Read settings from the environment; unparsable values fall back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let expr_cache = lookup("XMLNAV_EXPR_CACHE")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_EXPR_CACHE);
        let debug_index = lookup("XMLNAV_DEBUG_INDEX").is_some();
        Self {
            expr_cache,
            debug_index,
        }
    }

    /// The settings read from the environment on first use
    pub fn global() -> &'static Config {
        static CONFIG: OnceLock<Config> = OnceLock::new();
        CONFIG.get_or_init(Config::from_env)
    }
}
