// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Utility functions for Seer
//!
//! Small pure helpers shared by the engine and the CLI.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::chat::classify::ChatError;

/// Lock a mutex, recovering the data if a previous holder panicked
pub fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        tracing::warn!("mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Shorten text for log lines, on a character boundary
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Format a chat error for display to the user, with the available actions
pub fn format_chat_error(error: &ChatError) -> String {
    let mut msg = format!("Error [{}]: {}", error.kind, error.message);
    match (error.retryable, error.resumable) {
        (true, true) => msg.push_str("\nUse /retry to send again or /resume to continue."),
        (true, false) => msg.push_str("\nUse /retry to send again."),
        (false, true) => msg.push_str("\nUse /resume to continue."),
        (false, false) => {}
    }
    msg
}

/// Check if a command is an exit command
pub fn is_exit_command(input: &str) -> bool {
    let trimmed = input.trim().to_lowercase();
    matches!(trimmed.as_str(), "exit" | "quit" | "/exit" | "/quit")
}

/// Parse a slash command into (command_name, arguments)
///
/// Returns None if the input is not a slash command.
pub fn parse_slash_command(input: &str) -> Option<(&str, &str)> {
    let without_slash = input.trim().strip_prefix('/')?;
    match without_slash.find(char::is_whitespace) {
        Some(idx) => Some((&without_slash[..idx], without_slash[idx..].trim())),
        None => Some((without_slash, "")),
    }
}
