//! Client error types

use thiserror::Error;

/// Errors that can occur while talking to openGemini
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("openGemini unavailable")]
    Unavailable,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body carried an `error` key
    #[error("Query failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Classify a transport error the way callers care about it
    pub fn from_send(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_connect() {
            ClientError::Unavailable
        } else {
            ClientError::Request(e)
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
