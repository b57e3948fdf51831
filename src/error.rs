// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for Seer
//!
//! This module defines the crate-wide error types. The user-facing, uniform
//! error value handed to UI collaborators lives in [`crate::chat::classify`].

use thiserror::Error;

/// Main error type for Seer operations
#[derive(Error, Debug)]
pub enum SeerError {
    /// API-related errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential provider errors
    #[error("Auth error: {0}")]
    Auth(String),
}

/// API-specific error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server rejected our credentials (401/403)
    #[error("Authentication failed ({status})")]
    AuthenticationFailed { status: u16 },

    /// API returned a non-success status
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// The response body broke off mid-stream
    #[error("Streaming error: {0}")]
    StreamError(String),

    /// The caller aborted the in-flight request
    #[error("Request cancelled")]
    Cancelled,
}

/// Result type alias for Seer operations
pub type Result<T> = std::result::Result<T, SeerError>;

impl SeerError {
    /// Whether this error reflects an intentional abort rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SeerError::Api(ApiError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seer_error_config() {
        let err = SeerError::Config("bad config".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_seer_error_invalid_input() {
        let err = SeerError::InvalidInput("bad input".to_string());
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_seer_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SeerError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_api_error_authentication_failed() {
        let err = ApiError::AuthenticationFailed { status: 401 };
        assert!(err.to_string().contains("Authentication failed"));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_api_error_server_error() {
        let err = ApiError::ServerError {
            status: 500,
            message: "internal server error".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("internal server error"));
    }

    #[test]
    fn test_api_error_stream_error() {
        let err = ApiError::StreamError("stream closed".to_string());
        assert!(err.to_string().contains("Streaming error"));
    }

    #[test]
    fn test_seer_error_from_api_error() {
        let err: SeerError = ApiError::Network("refused".to_string()).into();
        assert!(err.to_string().contains("API error"));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_is_cancelled() {
        let err: SeerError = ApiError::Cancelled.into();
        assert!(err.is_cancelled());
    }
}
