//! Custom error types for the portal service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Custom error type for the portal service
///
/// Backend failures never reach this type: pages turn them into banners
/// or redirects. What is left is the server failing itself.
#[derive(Error, Debug)]
pub enum PortalError {
    /// A template failed to render
    #[error("Template rendering error: {0}")]
    Render(#[from] askama::Error),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        error!("{}", self);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong. Please try again later.",
        )
            .into_response()
    }
}

/// Type alias for portal results
pub type PortalResult<T> = Result<T, PortalError>;
