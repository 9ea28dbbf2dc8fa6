//! Adapter error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised by the adapter hooks.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// A version filter had to defer but was called without a continuation.
    #[error("HTTP adapter does not support filtering on version")]
    VersionFilterUnsupported,

    #[error("Version set must not be empty")]
    EmptyVersionSet,

    #[error("Invalid versioning options: {0}")]
    InvalidVersioning(String),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid value for header {name}")]
    InvalidHeaderValue { name: String },

    #[error("No view engine registered for extension '{0}'")]
    UnknownViewEngine(String),

    #[error("No views directory configured")]
    ViewsNotConfigured,

    #[error("Failed to render view {view}: {reason}")]
    Render { view: String, reason: String },

    #[error("Headers already sent")]
    HeadersAlreadySent,

    #[error("Handler panicked: {0}")]
    HandlerPanicked(String),

    #[error("Server is already listening")]
    AlreadyListening,

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed inside adapter");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdapterError::VersionFilterUnsupported;
        assert_eq!(
            err.to_string(),
            "HTTP adapter does not support filtering on version"
        );

        let err = AdapterError::InvalidHeaderValue { name: "x-test".into() };
        assert!(err.to_string().contains("x-test"));
    }

    #[test]
    fn test_error_response_is_internal() {
        let response = AdapterError::VersionFilterUnsupported.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
