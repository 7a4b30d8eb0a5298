//! Custom error types for the common library
//!
//! This module defines the errors raised while talking to the hosted
//! authentication and database service.

use thiserror::Error;

/// Custom error type for backend operations
#[derive(Error, Debug)]
pub enum BackendError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("Backend request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Backend responded with {status}: {message}")]
    Api { status: u16, message: String },

    /// The access token was missing, expired or rejected
    #[error("Not authenticated")]
    Unauthorized,

    /// No row matched the request
    #[error("Record not found")]
    NotFound,

    /// The backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with a body we could not interpret
    #[error("Unexpected backend response: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Backend configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with BackendError
pub type BackendResult<T> = Result<T, BackendError>;
