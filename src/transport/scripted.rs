// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Scripted transport for testing
//!
//! Replays pre-configured responses in order and records every request, so
//! the controller can be exercised without a server.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{ApiError, Result, SeerError};
use crate::transport::{ByteStream, ChatTransport, OutgoingRequest};
use crate::utils::lock_or_recover;

/// One scripted response
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Deliver these chunks, then end the body
    Chunks(Vec<Bytes>),
    /// Deliver these chunks, then keep the body open forever
    Hang(Vec<Bytes>),
    /// Deliver these chunks, then fail mid-stream
    BreakAfter(Vec<Bytes>, String),
    /// Answer with a non-success status
    Status { status: u16, body: String },
    /// Fail before any response arrives
    NetworkFailure(String),
}

impl ScriptedResponse {
    /// A complete SSE body delivered as a single chunk
    pub fn body(text: impl Into<String>) -> Self {
        ScriptedResponse::Chunks(vec![Bytes::from(text.into())])
    }

    /// An SSE body split into the given pieces
    pub fn chunked<I, S>(pieces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        ScriptedResponse::Chunks(pieces.into_iter().map(|p| Bytes::from(p.into())).collect())
    }
}

/// A transport that plays back scripted responses
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    recorded_requests: Arc<Mutex<Vec<OutgoingRequest>>>,
    open_count: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response (returned in FIFO order)
    pub fn with_response(self, response: ScriptedResponse) -> Self {
        self.push(response);
        self
    }

    pub fn push(&self, response: ScriptedResponse) {
        lock_or_recover(&self.responses).push_back(response);
    }

    /// Number of times `open` was called
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<OutgoingRequest> {
        lock_or_recover(&self.recorded_requests).clone()
    }

    pub fn last_request(&self) -> Option<OutgoingRequest> {
        lock_or_recover(&self.recorded_requests).last().cloned()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, request: OutgoingRequest) -> Result<ByteStream> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        lock_or_recover(&self.recorded_requests).push(request);

        let response = lock_or_recover(&self.responses)
            .pop_front()
            .unwrap_or_else(|| ScriptedResponse::body("data: [DONE]\n\n"));

        let stream: ByteStream = match response {
            ScriptedResponse::Chunks(chunks) => Box::pin(async_stream::stream! {
                for chunk in chunks {
                    yield Ok::<Bytes, SeerError>(chunk);
                }
            }),
            ScriptedResponse::Hang(chunks) => Box::pin(async_stream::stream! {
                for chunk in chunks {
                    yield Ok::<Bytes, SeerError>(chunk);
                }
                futures::future::pending::<()>().await;
            }),
            ScriptedResponse::BreakAfter(chunks, message) => Box::pin(async_stream::stream! {
                for chunk in chunks {
                    yield Ok::<Bytes, SeerError>(chunk);
                }
                yield Err(SeerError::Api(ApiError::StreamError(message)));
            }),
            ScriptedResponse::Status { status, body } => {
                return Err(if status == 401 || status == 403 {
                    SeerError::Api(ApiError::AuthenticationFailed { status })
                } else {
                    SeerError::Api(ApiError::ServerError {
                        status,
                        message: body,
                    })
                });
            }
            ScriptedResponse::NetworkFailure(message) => {
                return Err(SeerError::Api(ApiError::Network(message)));
            }
        };

        Ok(stream)
    }
}
