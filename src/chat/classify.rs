// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error classification
//!
//! Every failure a turn can hit ends up as one [`ChatError`] shape so the UI
//! only has to decide between offering retry, resume, or nothing.

use std::fmt;
use thiserror::Error;

use crate::chat::message::InBandError;
use crate::error::{ApiError, SeerError};

/// Tag for an in-band error that did not name its own type.
pub const IN_BAND_ERROR: &str = "in_band_error";

/// What kind of failure a [`ChatError`] describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401/403; the credential provider has been asked to re-authenticate
    Auth,
    /// The request could not be sent or the stream broke off
    Network,
    /// A non-success status other than 401/403
    Http { status: u16 },
    /// The request could not be built from the caller's input
    InvalidRequest,
    /// Reported by the server inside the stream, with its own tag
    InBand(String),
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Auth => "auth_error",
            ErrorKind::Network => "network_error",
            ErrorKind::Http { .. } => "http_error",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::InBand(tag) => tag,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform error value surfaced through `on_error` and `last_error`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ChatError {
    pub message: String,
    pub kind: ErrorKind,
    pub retryable: bool,
    pub resumable: bool,
}

impl ChatError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            retryable: false,
            resumable: false,
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn resumable(mut self, resumable: bool) -> Self {
        self.resumable = resumable;
        self
    }
}

/// Whether a failure should trigger the re-authentication hook.
pub fn requires_reauth(error: &SeerError) -> bool {
    matches!(
        error,
        SeerError::Api(ApiError::AuthenticationFailed { .. })
    )
}

fn status_is_retryable(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Map an out-of-band failure to a [`ChatError`].
///
/// Returns `None` for cancellation, which is never surfaced.
pub fn classify_failure(error: &SeerError) -> Option<ChatError> {
    let classified = match error {
        SeerError::Api(ApiError::Cancelled) => return None,
        SeerError::Api(ApiError::AuthenticationFailed { status }) => ChatError::new(
            ErrorKind::Auth,
            format!("Authentication failed ({}); please sign in again", status),
        ),
        SeerError::Auth(message) => ChatError::new(ErrorKind::Auth, message.clone()),
        SeerError::Api(ApiError::ServerError { status, message }) => ChatError::new(
            ErrorKind::Http { status: *status },
            format!("HTTP {}: {}", status, message),
        )
        .retryable(status_is_retryable(*status)),
        SeerError::InvalidInput(message) => {
            ChatError::new(ErrorKind::InvalidRequest, message.clone())
        }
        other => ChatError::new(ErrorKind::Network, other.to_string()).retryable(true),
    };
    Some(classified)
}

/// Pass an in-band error through with the server's flags, defaulting to false.
pub fn classify_in_band(error: &InBandError) -> ChatError {
    let tag = error
        .error_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(IN_BAND_ERROR);

    ChatError::new(ErrorKind::InBand(tag.to_string()), error.message.clone())
        .retryable(error.retryable.unwrap_or(false))
        .resumable(error.resumable.unwrap_or(false))
}
