// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Credential provider boundary
//!
//! The engine asks for a bearer token before every request and calls
//! [`CredentialProvider::reauthenticate`] when the server answers 401/403.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;

/// Supplies bearer credentials for chat requests
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Token for the `Authorization: Bearer` header; `None` sends no header.
    async fn bearer_token(&self) -> Result<Option<String>>;

    /// Called after the server rejected the current credentials.
    async fn reauthenticate(&self) {}
}

/// A fixed token, e.g. read from settings or the environment
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: Option<String>,
    reauth_requests: AtomicUsize,
}

impl StaticCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            reauth_requests: AtomicUsize::new(0),
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self::new(Some(token.into()))
    }

    /// Number of times the engine asked for re-authentication
    pub fn reauth_requests(&self) -> usize {
        self.reauth_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn bearer_token(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }

    async fn reauthenticate(&self) {
        self.reauth_requests.fetch_add(1, Ordering::SeqCst);
        tracing::warn!(
            target: "seer.auth",
            "server rejected credentials; a fresh sign-in is required"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let creds = StaticCredentials::with_token("abc");
        assert_eq!(creds.bearer_token().await.unwrap(), Some("abc".to_string()));
    }

    #[tokio::test]
    async fn test_reauth_is_counted() {
        let creds = StaticCredentials::new(None);
        assert_eq!(creds.bearer_token().await.unwrap(), None);
        creds.reauthenticate().await;
        creds.reauthenticate().await;
        assert_eq!(creds.reauth_requests(), 2);
    }
}
