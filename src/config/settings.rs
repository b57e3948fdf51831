// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for Seer
//!
//! Handles loading and saving settings from ~/.seer/settings.json

use serde::{Deserialize, Serialize};

use crate::chat::controller::ControllerOptions;
use crate::locale::Locale;

mod io;
mod validation;

/// Main settings structure, stored in ~/.seer/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Chat API endpoint and credentials
    #[serde(default)]
    pub api: ApiConfig,

    /// Defaults for new conversations
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Chat API configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the chat backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the streaming chat route
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    /// Path of the resume route
    #[serde(default = "default_resume_path")]
    pub resume_path: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Bearer token (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Conversation defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatConfig {
    /// Conversation mode sent with each turn
    #[serde(default = "default_mode")]
    pub default_mode: String,

    /// UI locale; decides the `language` request field
    #[serde(default)]
    pub locale: Locale,

    /// Title hint sent with each turn
    #[serde(default = "default_title")]
    pub title: String,

    /// Pause after showing the user's message, before the request goes out
    #[serde(default = "default_user_message_delay_ms")]
    pub user_message_delay_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_chat_path() -> String {
    "/api/chat/stream".to_string()
}

fn default_resume_path() -> String {
    "/api/chat/resume".to_string()
}

fn default_token_env() -> String {
    "SEER_TOKEN".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_mode() -> String {
    "chat".to_string()
}

fn default_title() -> String {
    "New conversation".to_string()
}

fn default_user_message_delay_ms() -> u64 {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_path: default_chat_path(),
            resume_path: default_resume_path(),
            token_env: default_token_env(),
            token: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
            locale: Locale::default(),
            title: default_title(),
            user_message_delay_ms: default_user_message_delay_ms(),
        }
    }
}

impl From<&ChatConfig> for ControllerOptions {
    fn from(config: &ChatConfig) -> Self {
        Self {
            default_mode: config.default_mode.clone(),
            title: config.title.clone(),
            user_message_delay: std::time::Duration::from_millis(config.user_message_delay_ms),
        }
    }
}
