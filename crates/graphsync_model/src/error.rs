//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while reading or mutating graph values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A value of one kind was found where another kind was required.
    #[error("expected {expected}, found {actual}")]
    UnexpectedKind {
        /// Kind that was required.
        expected: String,
        /// Kind that was found.
        actual: String,
    },

    /// The type catalog has no model with this name.
    #[error("unknown type: {type_name}")]
    UnknownType {
        /// Name of the missing type.
        type_name: String,
    },

    /// A type does not declare the requested field.
    #[error("field {field} not declared on type {type_name}")]
    UnknownField {
        /// Type that was inspected.
        type_name: String,
        /// Requested field.
        field: String,
    },

    /// A value does not fit the declared type of a field.
    #[error("field {field} declared as {declared} cannot hold {actual}")]
    TypeMismatch {
        /// Field being written.
        field: String,
        /// Declared field type.
        declared: String,
        /// Kind of the offending value.
        actual: String,
    },

    /// The value cannot be used as a correlation key.
    #[error("value of kind {actual} cannot be used as a key")]
    NotAKey {
        /// Kind of the offending value.
        actual: String,
    },

    /// A type model was declared twice.
    #[error("type already declared: {type_name}")]
    DuplicateType {
        /// Name of the duplicated type.
        type_name: String,
    },
}

impl ModelError {
    /// Creates an unexpected kind error.
    pub fn unexpected_kind(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::UnexpectedKind {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an unknown type error.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(
        field: impl Into<String>,
        declared: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            declared: declared.into(),
            actual: actual.into(),
        }
    }
}
