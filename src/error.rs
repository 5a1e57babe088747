//! Error types
//!
//! Movement failures and absent attributes or text are not errors; they are
//! reported as `false` or `None`. Everything in this enum is a hard failure
//! surfaced to the caller as-is and never retried.

use crate::core::unified_scanner::ScanError;

/// Errors raised by document construction, querying and extraction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The input is not well-formed XML
    #[error("malformed document at byte {offset}: {message}")]
    MalformedDocument { offset: usize, message: String },

    /// The path expression could not be compiled
    #[error("invalid path expression `{expr}`: {message}")]
    PathSyntax { expr: String, message: String },

    /// The path expression uses a prefix with no namespace binding
    #[error("unbound namespace prefix `{prefix}` in `{expr}`")]
    UnboundNamespacePrefix { prefix: String, expr: String },

    /// Text extraction was asked for an element that has child elements
    #[error("element <{name}> at byte {offset} (length {length}) has child elements")]
    MixedContent {
        name: String,
        offset: usize,
        length: usize,
        /// Literal markup of the offending element
        raw: String,
    },

    /// Tree conversion failed
    #[error("fragment parse error: {0}")]
    FragmentParse(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Self {
        Error::MalformedDocument {
            offset: err.offset,
            message: err.message,
        }
    }
}

impl Error {
    pub(crate) fn path_syntax(expr: &str, message: impl Into<String>) -> Self {
        Error::PathSyntax {
            expr: expr.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_becomes_malformed_document() {
        let err: Error = ScanError::new(7, "unclosed element <a>").into();
        assert_eq!(
            err,
            Error::MalformedDocument {
                offset: 7,
                message: "unclosed element <a>".to_string()
            }
        );
        assert_eq!(err.to_string(), "malformed document at byte 7: unclosed element <a>");
    }

    #[test]
    fn test_display_messages() {
        let err = Error::UnboundNamespacePrefix {
            prefix: "x".into(),
            expr: "//x:a".into(),
        };
        assert_eq!(err.to_string(), "unbound namespace prefix `x` in `//x:a`");

        let err = Error::path_syntax("//a[", "unclosed predicate");
        assert_eq!(err.to_string(), "invalid path expression `//a[`: unclosed predicate");
    }
}
