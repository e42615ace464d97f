// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by every typelib operation.
//!
//! All errors are precondition failures detected at the call site. Each
//! variant carries the name of the operation that raised it (`op`) and the
//! constraint that was violated, so a message is diagnosable on its own.

use crate::types::Category;
use thiserror::Error;

/// Errors returned by typelib operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// Unknown type name.
    #[error("{op}: type '{name}' not found")]
    NotFound { op: &'static str, name: String },

    /// A type with the same name but an incompatible layout is already registered.
    #[error("{op}: '{name}' conflicts with the registered definition ({reason})")]
    DuplicateConflict {
        op: &'static str,
        name: String,
        reason: String,
    },

    // ========================================================================
    // Size / Capacity Errors
    // ========================================================================
    /// Supplied bytes do not match the type's size.
    #[error("{op}: size mismatch for '{type_name}': required {expected} bytes, given {actual}")]
    SizeMismatch {
        op: &'static str,
        type_name: String,
        expected: usize,
        actual: usize,
    },

    /// A copy would exceed an endpoint's capacity.
    #[error("{op}: {endpoint} buffer too small: {requested} bytes requested, capacity {capacity}")]
    BufferTooSmall {
        op: &'static str,
        endpoint: &'static str,
        requested: usize,
        capacity: usize,
    },

    // ========================================================================
    // Argument Errors
    // ========================================================================
    /// The operation does not accept this argument (usually its category).
    #[error("{op}: invalid argument: {reason}")]
    InvalidArgument { op: &'static str, reason: String },

    /// The value's category or encoding does not fit the requested access.
    #[error("{op}: type mismatch on '{type_name}': expected {expected}, found {found}")]
    TypeMismatch {
        op: &'static str,
        type_name: String,
        expected: String,
        found: String,
    },

    /// Compound has no field with that name.
    #[error("{op}: '{type_name}' has no field '{field}'")]
    FieldNotFound {
        op: &'static str,
        type_name: String,
        field: String,
    },

    /// Array index outside `0..length`.
    #[error("{op}: index {index} out of bounds for '{type_name}' (length {length})")]
    IndexOutOfBounds {
        op: &'static str,
        type_name: String,
        index: usize,
        length: usize,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Options could not be read or parsed.
    #[cfg(feature = "config-loaders")]
    #[error("{op}: {source}")]
    Config {
        op: &'static str,
        #[source]
        source: ConfigSource,
    },
}

/// Underlying cause of a configuration error.
#[cfg(feature = "config-loaders")]
#[derive(Debug, Error)]
pub enum ConfigSource {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn invalid(op: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            op,
            reason: reason.into(),
        }
    }

    pub(crate) fn category_mismatch(
        op: &'static str,
        type_name: &str,
        expected: &str,
        found: Category,
    ) -> Self {
        Self::TypeMismatch {
            op,
            type_name: type_name.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Result alias for typelib operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_operation_and_constraint() {
        let err = Error::SizeMismatch {
            op: "allocate",
            type_name: "A".into(),
            expected: 16,
            actual: 3,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("allocate:"));
        assert!(msg.contains("required 16"));
        assert!(msg.contains("given 3"));

        let err = Error::BufferTooSmall {
            op: "typed_copy",
            endpoint: "destination",
            requested: 4,
            capacity: 2,
        };
        assert_eq!(
            err.to_string(),
            "typed_copy: destination buffer too small: 4 bytes requested, capacity 2"
        );
    }

    #[test]
    fn test_category_mismatch_helper() {
        let err = Error::category_mismatch("field", "float", "compound", Category::Numeric);
        assert_eq!(
            err.to_string(),
            "field: type mismatch on 'float': expected compound, found numeric"
        );
    }
}
