// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Event routing
//!
//! Decides what one assembled SSE event means for the current turn. Routing
//! is synchronous and side-effect free apart from the accumulator; the
//! controller applies the resulting [`RouteAction`] to observers and state.

use serde_json::Value;

use crate::chat::accumulator::AccumulatorState;
use crate::chat::classify::{classify_in_band, ChatError};
use crate::chat::message::{parse_limit_info, ChatMessage, FunctionResult, StreamPayload};
use crate::sse::{AssembledEvent, SsePayload, DEFAULT_EVENT};

pub const THINKING_EVENT: &str = "thinking";
pub const LIMIT_REACHED_EVENT: &str = "limit_reached";
pub const REFRESH_CHARACTERS_EVENT: &str = "refresh_characters";
pub const REFRESH_REPORTS_EVENT: &str = "refresh_reports";
pub const FUNCTION_EVENT_PREFIX: &str = "function_";

/// Why an event produced no action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The payload was not valid JSON
    Malformed,
    /// Nothing this router acts on: an unknown event, a function call
    /// without a result, or a message without content
    Empty,
}

/// Outcome of routing one event
#[derive(Debug, Clone, PartialEq)]
pub enum RouteAction {
    /// `[DONE]` sentinel
    Done,
    /// Quota exhausted; carries the synthetic assistant notice
    LimitReached(ChatMessage),
    /// In-band error reported by the server
    Error(ChatError),
    /// Cumulative thinking text after this delta
    Thinking(String),
    RefreshCharacters(Value),
    RefreshReports(Value),
    /// Standalone message carrying a function result
    FunctionResult(ChatMessage),
    /// Cumulative live text after this partial chunk
    Partial(String),
    /// The finished assistant message
    Final(ChatMessage),
    /// The event belongs to a turn that is no longer active
    Stale,
    Ignored(IgnoreReason),
}

impl RouteAction {
    /// Whether this action completes the turn and stops the read loop.
    pub fn ends_turn(&self) -> bool {
        matches!(
            self,
            RouteAction::Done | RouteAction::LimitReached(_) | RouteAction::Final(_)
        )
    }
}

/// A routed event plus the session id it carried, if any
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub action: RouteAction,
    pub session_id: Option<String>,
}

impl Routed {
    fn new(action: RouteAction) -> Self {
        Self {
            action,
            session_id: None,
        }
    }
}

/// Stateless event router; all turn state lives in [`AccumulatorState`].
#[derive(Debug, Default, Clone, Copy)]
pub struct EventRouter;

impl EventRouter {
    pub fn new() -> Self {
        Self
    }

    /// Route one event that arrived while reading the stream of `turn`.
    pub fn route(&self, event: &AssembledEvent, turn: u64, acc: &mut AccumulatorState) -> Routed {
        if !acc.is_active(turn) {
            tracing::debug!(
                target: "seer.chat.router",
                turn,
                active = ?acc.active_turn(),
                event = %event.event,
                "dropping event from inactive turn"
            );
            return Routed::new(RouteAction::Stale);
        }

        let raw = match &event.payload {
            SsePayload::Done => return Routed::new(RouteAction::Done),
            SsePayload::Data(raw) => raw,
        };

        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    target: "seer.chat.router",
                    event = %event.event,
                    error = %err,
                    "skipping malformed data line"
                );
                return Routed::new(RouteAction::Ignored(IgnoreReason::Malformed));
            }
        };

        let typed = if value.is_object() {
            serde_json::from_value(value.clone())
        } else {
            Err(serde::de::Error::custom(format!("expected a JSON object, got {}", value)))
        };
        let payload: StreamPayload = match typed {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(
                    target: "seer.chat.router",
                    event = %event.event,
                    error = %err,
                    "skipping data line that is not a JSON object"
                );
                return Routed::new(RouteAction::Ignored(IgnoreReason::Malformed));
            }
        };
        let session_id = payload.session_id().map(str::to_string);
        let action = self.route_payload(&event.event, value, &payload, acc);

        Routed { action, session_id }
    }

    fn route_payload(
        &self,
        event: &str,
        value: Value,
        payload: &StreamPayload,
        acc: &mut AccumulatorState,
    ) -> RouteAction {
        if event == LIMIT_REACHED_EVENT {
            let info = parse_limit_info(&value);
            acc.take();
            return RouteAction::LimitReached(ChatMessage::assistant(info.message.clone()).with_limit(info));
        }

        if let Some(error) = payload.in_band_error() {
            return RouteAction::Error(classify_in_band(&error));
        }

        if event == THINKING_EVENT {
            if let Some(thinking) = payload.thinking_text() {
                return RouteAction::Thinking(acc.append_thinking(thinking).to_string());
            }
        }

        match event {
            REFRESH_CHARACTERS_EVENT => return RouteAction::RefreshCharacters(value),
            REFRESH_REPORTS_EVENT => return RouteAction::RefreshReports(value),
            _ => {}
        }

        if event.starts_with(FUNCTION_EVENT_PREFIX) {
            if let Some(data) = payload.function_result() {
                let result = FunctionResult {
                    name: event.to_string(),
                    data: data.clone(),
                };
                return RouteAction::FunctionResult(
                    ChatMessage::assistant("").with_function_result(result),
                );
            }
        }

        let carries_message = payload.content.is_some() || value.get("partial").is_some();
        if event != DEFAULT_EVENT || !carries_message {
            tracing::debug!(target: "seer.chat.router", event, "ignoring event without message content");
            return RouteAction::Ignored(IgnoreReason::Empty);
        }

        if payload.partial {
            return match payload.text() {
                Some(text) if !text.is_empty() => {
                    RouteAction::Partial(acc.apply_partial(text).to_string())
                }
                _ => RouteAction::Ignored(IgnoreReason::Empty),
            };
        }

        acc.apply_final(payload.text());
        let (text, thinking) = acc.take();
        let mut message = ChatMessage::assistant(text).with_thinking(thinking);
        if let Some(id) = payload.message_id() {
            message = message.with_id(id);
        }
        RouteAction::Final(message)
    }
}
