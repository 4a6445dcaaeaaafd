//! Operator registry error types

use thiserror::Error;

/// Errors raised by the operator registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperatorError {
    /// No operator is registered under the requested type
    #[error("Operator not found: {0}")]
    NotFound(String),

    /// An operator with the same type is already registered
    #[error("Duplicate operator: {0}")]
    Duplicate(String),
}

/// Result type for registry operations
pub type OperatorResult<T> = Result<T, OperatorError>;
