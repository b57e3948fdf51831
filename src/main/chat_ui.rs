// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io::{self, Write};
use std::sync::Mutex;

use crossterm::{
    style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor},
    ExecutableCommand,
};
use serde_json::Value;

use seer::chat::{ChatError, ChatMessage, ChatObserver};
use seer::error::Result;
use seer::utils::{self, lock_or_recover};

/// Cumulative text that has already been written to the terminal
#[derive(Debug, Default)]
struct Printed {
    answer: String,
    thinking: String,
}

/// Renders a conversation on stdout/stderr and keeps its history for /retry
#[derive(Debug, Default)]
pub(super) struct TerminalObserver {
    printed: Mutex<Printed>,
    history: Mutex<Vec<ChatMessage>>,
}

impl TerminalObserver {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn history(&self) -> Vec<ChatMessage> {
        lock_or_recover(&self.history).clone()
    }

    /// Forget partially printed text after an aborted turn.
    pub(super) fn reset_stream(&self) {
        let mut printed = lock_or_recover(&self.printed);
        if !printed.answer.is_empty() || !printed.thinking.is_empty() {
            println!();
        }
        *printed = Printed::default();
    }
}

/// The part of `text` not yet shown, or all of it if the server rewrote
/// what was already printed.
fn unseen<'a>(shown: &str, text: &'a str) -> (bool, &'a str) {
    match text.strip_prefix(shown) {
        Some(rest) => (false, rest),
        None => (true, text),
    }
}

impl ChatObserver for TerminalObserver {
    fn on_message(&self, message: &ChatMessage) {
        lock_or_recover(&self.history).push(message.clone());
        if message.is_user() {
            return;
        }

        let mut printed = lock_or_recover(&self.printed);
        if let Some(result) = &message.function_result {
            let _ = print_function_result(&result.name, &result.data);
        } else if let Some(limit) = &message.limit {
            let _ = print_notice(&limit.message);
        } else {
            let (rewritten, rest) = unseen(&printed.answer, &message.content);
            if rewritten && !printed.answer.is_empty() {
                println!();
            }
            print!("{}", rest);
            if message.failed {
                let _ = print_notice("[incomplete]");
            }
            println!();
            *printed = Printed::default();
        }
        let _ = io::stdout().flush();
    }

    fn on_error(&self, error: &ChatError) {
        let _ = print_error(&utils::format_chat_error(error));
    }

    fn on_refresh_characters(&self, _payload: &Value) {
        tracing::debug!(target: "seer.cli", "character list changed");
    }

    fn on_refresh_reports(&self, _payload: &Value) {
        tracing::debug!(target: "seer.cli", "report list changed");
    }

    fn on_partial(&self, text: &str) {
        let mut printed = lock_or_recover(&self.printed);
        let (rewritten, rest) = unseen(&printed.answer, text);
        if rewritten && !printed.answer.is_empty() {
            println!();
        }
        print!("{}", rest);
        let _ = io::stdout().flush();
        printed.answer = text.to_string();
    }

    fn on_thinking(&self, text: &str) {
        let mut printed = lock_or_recover(&self.printed);
        let (_, rest) = unseen(&printed.thinking, text);
        let _ = print_thinking(rest);
        printed.thinking = text.to_string();
    }
}

/// Print the assistant's name before its answer
pub(super) fn print_response_prefix() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    print!("\nseer: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;
    Ok(())
}

fn print_thinking(text: &str) -> Result<()> {
    let mut stderr = io::stderr();
    stderr.execute(SetAttribute(Attribute::Dim))?;
    eprint!("{}", text);
    stderr.execute(SetAttribute(Attribute::Reset))?;
    stderr.flush()?;
    Ok(())
}

fn print_notice(text: &str) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Yellow))?;
    print!("{}", text);
    stdout.execute(ResetColor)?;
    Ok(())
}

fn print_function_result(name: &str, data: &Value) -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Magenta))?;
    println!("[{}]", name);
    stdout.execute(ResetColor)?;
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

pub(super) fn print_error(text: &str) -> Result<()> {
    let mut stderr = io::stderr();
    stderr.execute(SetForegroundColor(Color::Red))?;
    eprintln!("\n{}", text);
    stderr.execute(ResetColor)?;
    Ok(())
}
