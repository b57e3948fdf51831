// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Callbacks from the chat engine to its UI collaborator

use serde_json::Value;
use std::sync::Mutex;

use crate::chat::classify::ChatError;
use crate::chat::message::ChatMessage;
use crate::utils::lock_or_recover;

/// Receives chat engine output. Every method defaults to a no-op.
///
/// Callbacks run on the task driving the turn, between chunk reads, so they
/// should return quickly.
pub trait ChatObserver: Send + Sync {
    /// A complete message: the user's own, an assistant answer, a function
    /// result, or a limit notice.
    fn on_message(&self, _message: &ChatMessage) {}

    fn on_error(&self, _error: &ChatError) {}

    /// The turn completed normally.
    fn on_complete(&self, _session_id: Option<&str>) {}

    fn on_refresh_characters(&self, _payload: &Value) {}

    fn on_refresh_reports(&self, _payload: &Value) {}

    /// Live assistant text so far.
    fn on_partial(&self, _text: &str) {}

    /// Thinking text so far.
    fn on_thinking(&self, _text: &str) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ChatObserver for NoopObserver {}

/// One recorded callback
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    Message(ChatMessage),
    Error(ChatError),
    Complete(Option<String>),
    RefreshCharacters(Value),
    RefreshReports(Value),
    Partial(String),
    Thinking(String),
}

/// Observer that records every callback in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        lock_or_recover(&self.events).clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ChatError> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Error(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<Option<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Complete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ObservedEvent) {
        lock_or_recover(&self.events).push(event);
    }
}

impl ChatObserver for RecordingObserver {
    fn on_message(&self, message: &ChatMessage) {
        self.push(ObservedEvent::Message(message.clone()));
    }

    fn on_error(&self, error: &ChatError) {
        self.push(ObservedEvent::Error(error.clone()));
    }

    fn on_complete(&self, session_id: Option<&str>) {
        self.push(ObservedEvent::Complete(session_id.map(str::to_string)));
    }

    fn on_refresh_characters(&self, payload: &Value) {
        self.push(ObservedEvent::RefreshCharacters(payload.clone()));
    }

    fn on_refresh_reports(&self, payload: &Value) {
        self.push(ObservedEvent::RefreshReports(payload.clone()));
    }

    fn on_partial(&self, text: &str) {
        self.push(ObservedEvent::Partial(text.to_string()));
    }

    fn on_thinking(&self, text: &str) {
        self.push(ObservedEvent::Thinking(text.to_string()));
    }
}
