//! Error types for observation and key-value access.
//!
//! All fallible operations in this crate report through [`ObserveError`],
//! which integrates with [`miette`] for rich terminal diagnostics.
//!
//! # Error Variants
//!
//! | Variant | When It Occurs |
//! |---------|----------------|
//! | [`ObserveError::InvalidKeyPath`] | A key-path string is malformed |
//! | [`ObserveError::InvalidState`] | Operating on an observer after it was removed |
//! | [`ObserveError::TypeMismatch`] | A value cannot be coerced to the requested shape |
//! | [`ObserveError::UnknownKey`] | The target has no property at the key path |
//! | [`ObserveError::ReadOnly`] | Writing a property declared read-only |
//! | [`ObserveError::NotACollection`] | A relationship mutation on a scalar property |
//! | [`ObserveError::IndexOutOfBounds`] | An ordered mutation index is past the end |
//! | [`ObserveError::Transform`] | A mapping transform failed |
//! | [`ObserveError::ReactionPanicked`] | A reaction panicked during dispatch |
//!
//! # Propagation
//!
//! Registration and mutation calls return these errors directly. Failures
//! raised while a reaction runs never abort the dispatch: they are logged
//! and handed to the observer's error callback, and the remaining reactions
//! still run.

use std::error::Error as StdError;

use miette::Diagnostic;
use thiserror::Error;

/// Boxed error returned by user-supplied transforms.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ObserveError>;

/// Errors produced by observers, observable objects and value coercion.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ObserveError {
    /// A key-path string could not be parsed.
    #[error("invalid key path '{path}': {reason}")]
    #[diagnostic(
        code(propwatch::invalid_key_path),
        help("key paths are non-empty, dot-separated identifiers such as \"address.city\"")
    )]
    InvalidKeyPath {
        /// The rejected key-path text.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The observer was removed from its target and can no longer be configured.
    #[error("observer for '{key_path}' has been removed; cannot {operation}")]
    #[diagnostic(
        code(propwatch::invalid_state),
        help("create a new observer if you need to keep observing this property")
    )]
    InvalidState {
        /// Key path of the removed observer.
        key_path: String,
        /// The rejected operation.
        operation: &'static str,
    },

    /// A value does not have the shape a reaction or field expects.
    #[error("type mismatch at '{key_path}': expected {expected}, found {found}")]
    #[diagnostic(code(propwatch::type_mismatch))]
    TypeMismatch {
        /// Key path whose value was being unwrapped.
        key_path: String,
        /// The requested shape.
        expected: &'static str,
        /// The stored shape.
        found: &'static str,
    },

    /// The target has no property at the key path.
    #[error("unknown key path '{key_path}'")]
    #[diagnostic(
        code(propwatch::unknown_key),
        help("check the spelling of the key path against the target's properties")
    )]
    UnknownKey {
        /// The unresolved key path.
        key_path: String,
    },

    /// The property cannot be written.
    #[error("property '{key_path}' is read-only")]
    #[diagnostic(code(propwatch::read_only))]
    ReadOnly {
        /// The read-only key path.
        key_path: String,
    },

    /// A relationship mutation targeted a property that is not a collection.
    #[error("property '{key_path}' is not a {expected}")]
    #[diagnostic(
        code(propwatch::not_a_collection),
        help("ordered mutations need a list, unordered mutations need a set")
    )]
    NotACollection {
        /// Key path of the mutated property.
        key_path: String,
        /// The collection shape the mutation needs.
        expected: &'static str,
    },

    /// An ordered mutation referenced an index past the end of the list.
    #[error("index {index} out of bounds for '{key_path}' (len {len})")]
    #[diagnostic(code(propwatch::index_out_of_bounds))]
    IndexOutOfBounds {
        /// Key path of the mutated list.
        key_path: String,
        /// The offending index.
        index: usize,
        /// Length of the list at the time of the mutation.
        len: usize,
    },

    /// A mapping transform returned an error.
    #[error("transform for '{key_path}' failed: {source}")]
    #[diagnostic(code(propwatch::transform_failed))]
    Transform {
        /// Key path of the observed property.
        key_path: String,
        /// The error raised by the transform.
        #[source]
        source: BoxError,
    },

    /// A reaction panicked while handling a change.
    #[error("reaction for '{key_path}' panicked: {message}")]
    #[diagnostic(
        code(propwatch::reaction_panicked),
        help("the remaining reactions still ran; fix the panicking reaction")
    )]
    ReactionPanicked {
        /// Key path of the observed property.
        key_path: String,
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl ObserveError {
    /// Create a new `InvalidKeyPath` error.
    pub fn invalid_key_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKeyPath {
            path: path.into(),
            reason,
        }
    }

    /// Create a new `InvalidState` error.
    pub fn invalid_state(key_path: impl Into<String>, operation: &'static str) -> Self {
        Self::InvalidState {
            key_path: key_path.into(),
            operation,
        }
    }

    /// Create a new `TypeMismatch` error.
    pub fn type_mismatch(
        key_path: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            key_path: key_path.into(),
            expected,
            found,
        }
    }

    /// Create a new `UnknownKey` error.
    pub fn unknown_key(key_path: impl Into<String>) -> Self {
        Self::UnknownKey {
            key_path: key_path.into(),
        }
    }

    /// Create a new `ReadOnly` error.
    pub fn read_only(key_path: impl Into<String>) -> Self {
        Self::ReadOnly {
            key_path: key_path.into(),
        }
    }

    /// Create a new `NotACollection` error.
    pub fn not_a_collection(key_path: impl Into<String>, expected: &'static str) -> Self {
        Self::NotACollection {
            key_path: key_path.into(),
            expected,
        }
    }

    /// Create a new `IndexOutOfBounds` error.
    pub fn index_out_of_bounds(key_path: impl Into<String>, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            key_path: key_path.into(),
            index,
            len,
        }
    }

    /// Create a new `Transform` error.
    pub fn transform(key_path: impl Into<String>, source: BoxError) -> Self {
        Self::Transform {
            key_path: key_path.into(),
            source,
        }
    }

    /// Create a new `ReactionPanicked` error.
    pub fn reaction_panicked(key_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReactionPanicked {
            key_path: key_path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for errors raised while a reaction was running.
    #[must_use]
    pub const fn is_reaction_failure(&self) -> bool {
        matches!(
            self,
            Self::TypeMismatch { .. } | Self::Transform { .. } | Self::ReactionPanicked { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ObserveError::invalid_key_path("a..b", "empty segment");
        assert!(err.to_string().contains("a..b"));
        assert!(err.to_string().contains("empty segment"));

        let err = ObserveError::invalid_state("count", "register a reaction");
        assert!(err.to_string().contains("removed"));

        let err = ObserveError::type_mismatch("frame", "rect", "string");
        assert!(err.to_string().contains("expected rect, found string"));

        let err = ObserveError::index_out_of_bounds("items", 7, 3);
        assert!(err.to_string().contains("index 7"));
        assert!(err.to_string().contains("len 3"));
    }

    #[test]
    fn test_transform_keeps_source() {
        let source: BoxError = "bad input".into();
        let err = ObserveError::transform("title", source);

        let chained = StdError::source(&err).map(ToString::to_string);
        assert_eq!(chained.as_deref(), Some("bad input"));
    }

    #[test]
    fn test_reaction_failure_classification() {
        assert!(ObserveError::type_mismatch("x", "bool", "rect").is_reaction_failure());
        assert!(ObserveError::reaction_panicked("x", "boom").is_reaction_failure());
        assert!(!ObserveError::unknown_key("x").is_reaction_failure());
        assert!(!ObserveError::invalid_state("x", "configure").is_reaction_failure());
    }
}
