// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Network transport for chat turns
//!
//! A transport POSTs one JSON body and hands back the response body as a
//! stream of byte chunks. Non-success statuses are reported as errors before
//! any body is read.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::fmt;
use std::pin::Pin;

use crate::error::Result;

pub mod http;
pub mod scripted;

pub use http::HttpTransport;
pub use scripted::{ScriptedResponse, ScriptedTransport};

/// Response body as delivered by the network, chunk by chunk
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Which server route a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Send a new (or retried) turn
    Chat,
    /// Replay an interrupted turn of an existing session
    Resume,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Chat => write!(f, "chat"),
            Endpoint::Resume => write!(f, "resume"),
        }
    }
}

/// A fully built request, ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub endpoint: Endpoint,
    pub body: serde_json::Value,
    pub bearer_token: Option<String>,
}

/// Opens streaming chat responses
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the request and return the body stream of a success response.
    ///
    /// 401/403 map to `ApiError::AuthenticationFailed`, other non-success
    /// statuses to `ApiError::ServerError` carrying the response body.
    async fn open(&self, request: OutgoingRequest) -> Result<ByteStream>;
}
