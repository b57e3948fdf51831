// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! HTTP transport backed by reqwest

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::config::Settings;
use crate::error::{ApiError, Result, SeerError};
use crate::transport::{ByteStream, ChatTransport, Endpoint, OutgoingRequest};

const EVENT_STREAM: &str = "text/event-stream";
const DEFAULT_CHAT_PATH: &str = "/api/chat/stream";
const DEFAULT_RESUME_PATH: &str = "/api/chat/resume";

/// Streams chat turns over HTTP(S)
///
/// The client keeps no cookie store; authorization is bearer-only.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    chat_path: String,
    resume_path: String,
}

impl HttpTransport {
    /// Create a transport with the default route paths
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            resume_path: DEFAULT_RESUME_PATH.to_string(),
        }
    }

    /// Create a transport from settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.api.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url(),
            chat_path: settings.api.chat_path.clone(),
            resume_path: settings.api.resume_path.clone(),
        })
    }

    /// Override the route paths
    pub fn with_paths(mut self, chat_path: impl Into<String>, resume_path: impl Into<String>) -> Self {
        self.chat_path = chat_path.into();
        self.resume_path = resume_path.into();
        self
    }

    /// Full URL for an endpoint
    pub fn url(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::Chat => &self.chat_path,
            Endpoint::Resume => &self.resume_path,
        };
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Map a non-success status and its body to an error.
fn status_error(status: StatusCode, body: String) -> SeerError {
    let code = status.as_u16();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return SeerError::Api(ApiError::AuthenticationFailed { status: code });
    }

    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    };
    SeerError::Api(ApiError::ServerError {
        status: code,
        message,
    })
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, request: OutgoingRequest) -> Result<ByteStream> {
        let url = self.url(request.endpoint);
        tracing::debug!(target: "seer.transport", %url, endpoint = %request.endpoint, "opening stream");

        let mut builder = self
            .client
            .post(&url)
            .header(ACCEPT, EVENT_STREAM)
            .header(CONTENT_TYPE, "application/json")
            .json(&request.body);
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SeerError::Api(ApiError::Network(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(target: "seer.transport", status = status.as_u16(), "non-success response");
            return Err(status_error(status, body));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| SeerError::Api(ApiError::StreamError(e.to_string()))));

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_and_path() {
        let transport = HttpTransport::new("https://api.example.com/");
        assert_eq!(
            transport.url(Endpoint::Chat),
            "https://api.example.com/api/chat/stream"
        );
        assert_eq!(
            transport.url(Endpoint::Resume),
            "https://api.example.com/api/chat/resume"
        );
    }

    #[test]
    fn test_custom_paths() {
        let transport = HttpTransport::new("http://localhost:9000").with_paths("/c", "/r");
        assert_eq!(transport.url(Endpoint::Chat), "http://localhost:9000/c");
        assert_eq!(transport.url(Endpoint::Resume), "http://localhost:9000/r");
    }

    #[test]
    fn test_status_error_auth() {
        let err = status_error(StatusCode::FORBIDDEN, "nope".to_string());
        assert!(matches!(
            err,
            SeerError::Api(ApiError::AuthenticationFailed { status: 403 })
        ));
    }

    #[test]
    fn test_status_error_uses_reason_for_empty_body() {
        let err = status_error(StatusCode::BAD_GATEWAY, String::new());
        match err {
            SeerError::Api(ApiError::ServerError { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
