//! Datasource error types

use crate::client::ClientError;
use crate::query::QueryError;
use thiserror::Error;

/// Errors that can occur while executing datasource requests
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    /// A time range bound that is neither relative, RFC 3339 nor epoch milliseconds
    #[error("Unable to parse date: {0}")]
    InvalidTime(String),
}

/// Result type for datasource operations
pub type DataSourceResult<T> = Result<T, DataSourceError>;
