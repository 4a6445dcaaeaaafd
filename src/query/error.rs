//! Query error types
//!
//! Defines the error conditions raised while composing chains and building
//! query text.

use crate::operators::OperatorError;
use thiserror::Error;

/// Errors that can occur during query composition and building
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A chain references an operator the registry does not know
    #[error("Unknown operator: {0}")]
    UnknownOperator(#[from] OperatorError),

    /// Select chain index out of range
    #[error("Select chain {index} out of range ({len} chains)")]
    ChainIndexOutOfRange { index: usize, len: usize },

    /// Condition index out of range within a chain
    #[error("Condition {index} out of range ({len} conditions)")]
    PartIndexOutOfRange { index: usize, len: usize },

    /// Group-by index out of range
    #[error("Group by condition {index} out of range ({len} conditions)")]
    GroupByIndexOutOfRange { index: usize, len: usize },

    /// Group-by-only operator used in a select chain
    #[error("Operator cannot be used in a select chain: {0}")]
    NotSelectOperator(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
