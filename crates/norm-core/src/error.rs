//! Error types for metadata, SQL synthesis and value conversion.

use thiserror::Error;

use crate::dialect::Dialect;
use crate::schema::SemanticType;

/// Errors raised while turning entity metadata into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The entity reached the builder without a usable collection name.
    #[error("Collection name not found for type {0}")]
    MissingCollectionName(&'static str),

    /// A column's semantic type has no mapping in the target dialect.
    #[error("Type {semantic} of column '{column}' is not supported by {dialect}")]
    UnsupportedSemanticType {
        /// Column whose type could not be mapped.
        column: String,
        /// The declared semantic type.
        semantic: SemanticType,
        /// The dialect that lacks the mapping.
        dialect: Dialect,
    },

    /// The predicate compiler met a node outside `{And, Equals}`.
    #[error("Expression type {0} is not supported")]
    UnsupportedPredicate(String),

    /// An operation keyed on the primary key was requested for an entity
    /// that declares none.
    #[error("Type {0} has no primary key")]
    MissingPrimaryKey(&'static str),
}

/// Errors raised while converting between Rust field values and SQL values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The SQL value has a shape the field type cannot accept.
    #[error("cannot convert {found} to {expected}")]
    TypeMismatch {
        /// Rust type of the receiving field.
        expected: &'static str,
        /// Kind of the SQL value offered.
        found: &'static str,
    },

    /// The SQL value is numeric but does not fit the field type.
    #[error("value {value} is out of range for {expected}")]
    OutOfRange {
        /// Rust type of the receiving field.
        expected: &'static str,
        /// The offending value, rendered.
        value: String,
    },

    /// Timestamp text in neither of the accepted layouts.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    /// `NULL` offered to a non-nullable field.
    #[error("NULL is not allowed for {0}")]
    UnexpectedNull(&'static str),

    /// The entity has no column at the given position.
    #[error("no column at index {0}")]
    UnknownColumn(usize),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
