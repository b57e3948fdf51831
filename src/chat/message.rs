// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat data model and wire types
//!
//! `ChatTurnRequest`/`ResumeRequest` are what we POST; `StreamPayload` is the
//! JSON carried by each `data:` line; `ChatMessage` is what the UI renders.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, SeerError};

/// Most attachments (four-pillars charts) one turn may reference.
pub const MAX_ATTACHMENTS: usize = 2;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Quota information carried by a `limit_reached` control event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitInfo {
    pub current: u64,
    pub limit: u64,
    pub message: String,
}

/// Structured result of a server-side function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    /// Full event name, e.g. `function_bazi_chart`
    pub name: String,
    pub data: Value,
}

/// A message handed to the UI collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub is_complete: bool,
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_result: Option<FunctionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<LimitInfo>,
}

impl ChatMessage {
    fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            is_complete: true,
            failed: false,
            thinking: None,
            function_result: None,
            limit: None,
        }
    }

    /// A user message, complete as soon as it is sent
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    /// A complete assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, content)
    }

    /// Use a server-supplied id instead of a generated one
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach thinking text; empty text is dropped
    pub fn with_thinking(mut self, thinking: impl Into<String>) -> Self {
        let thinking = thinking.into();
        self.thinking = (!thinking.is_empty()).then_some(thinking);
        self
    }

    pub fn with_function_result(mut self, result: FunctionResult) -> Self {
        self.function_result = Some(result);
        self
    }

    pub fn with_limit(mut self, limit: LimitInfo) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Mark as belonging to a turn that ended in error
    pub fn failed(mut self) -> Self {
        self.failed = true;
        self
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Request body for one chat turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurnRequest {
    pub message: String,
    pub session_id: Option<String>,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub four_pillars_ids: Option<Vec<String>>,
    pub stream: bool,
    pub title: String,
    pub language: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_retry: bool,
}

impl ChatTurnRequest {
    pub fn new(
        message: impl Into<String>,
        mode: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            mode: mode.into(),
            four_pillars_ids: None,
            stream: true,
            title: String::new(),
            language: language.into(),
            is_retry: false,
        }
    }

    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_retry(mut self, is_retry: bool) -> Self {
        self.is_retry = is_retry;
        self
    }

    /// Reference one or two attachments. An empty list means none.
    pub fn with_attachments(mut self, ids: Vec<String>) -> Result<Self> {
        if ids.len() > MAX_ATTACHMENTS {
            return Err(SeerError::InvalidInput(format!(
                "at most {} attachments per turn, got {}",
                MAX_ATTACHMENTS,
                ids.len()
            )));
        }
        self.four_pillars_ids = (!ids.is_empty()).then_some(ids);
        Ok(self)
    }
}

/// Request body asking the server to replay an interrupted turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeRequest {
    pub session_id: String,
    pub stream: bool,
    pub language: String,
}

impl ResumeRequest {
    pub fn new(session_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            stream: true,
            language: language.into(),
        }
    }
}

/// JSON carried by a `data:` line
///
/// Every field tolerates a wrong type by reading as absent, so one odd field
/// never discards the rest of the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<StreamContent>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub partial: bool,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub thinking: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub error_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub retryable: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub resumable: Option<bool>,
    #[serde(default)]
    pub function_result: Option<Value>,
}

/// The `content` object of a stream payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamContent {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub thinking: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub error_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub retryable: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub resumable: Option<bool>,
    #[serde(default)]
    pub function_result: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Strings as-is, numbers rendered; anything else is absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// `true`, or the string `"true"`; anything else is `false`.
fn lenient_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(flag) => flag,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// An in-band error as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InBandError {
    pub message: String,
    pub error_type: Option<String>,
    pub retryable: Option<bool>,
    pub resumable: Option<bool>,
}

impl StreamPayload {
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref()?.text.as_deref()
    }

    /// Thinking text, preferring `content.thinking`
    pub fn thinking_text(&self) -> Option<&str> {
        self.content
            .as_ref()
            .and_then(|c| c.thinking.as_deref())
            .or(self.thinking.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// Server-assigned session id, if non-empty
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Server message id rendered as a string
    pub fn message_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn function_result(&self) -> Option<&Value> {
        let content = self.content.as_ref();
        self.function_result
            .as_ref()
            .or_else(|| content.and_then(|c| c.function_result.as_ref()))
            .or_else(|| content.and_then(|c| c.result.as_ref()))
            .filter(|v| !v.is_null())
    }

    /// The in-band error, if the payload carries a non-empty one
    pub fn in_band_error(&self) -> Option<InBandError> {
        if let Some(content) = &self.content {
            if let Some(message) = content.error.as_ref().and_then(error_message) {
                return Some(InBandError {
                    message,
                    error_type: content.error_type.clone().or(self.error_type.clone()),
                    retryable: content.retryable.or(self.retryable),
                    resumable: content.resumable.or(self.resumable),
                });
            }
        }

        let message = self.error.as_ref().and_then(error_message)?;
        Some(InBandError {
            message,
            error_type: self.error_type.clone(),
            retryable: self.retryable,
            resumable: self.resumable,
        })
    }
}

fn error_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .or_else(|| (!map.is_empty()).then(|| value.to_string())),
        Value::Bool(true) => Some("Unknown server error".to_string()),
        _ => None,
    }
}

fn lookup<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let find = |scope: &'a Value| keys.iter().find_map(|k| scope.get(*k));
    find(value).or_else(|| value.get("content").and_then(find))
}

/// Read a limit notice from a control payload, top level or under `content`.
pub fn parse_limit_info(value: &Value) -> LimitInfo {
    let current = lookup(value, &["current", "current_count", "count", "used"])
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let limit = lookup(value, &["limit", "max"])
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let message = lookup(value, &["message", "text"])
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Message limit reached ({}/{})", current, limit));

    LimitInfo {
        current,
        limit,
        message,
    }
}
