// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for Seer.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::locale::Locale;

/// Seer - streaming chat client for your terminal
#[derive(Parser, Debug)]
#[command(name = "seer")]
#[command(version, about = "Streaming chat client for your terminal")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start interactive chat session (default when no command given)
    Chat(ChatArgs),

    /// Send a single message (non-interactive)
    Ask(AskArgs),

    /// Replay an interrupted turn of an existing session
    Resume(ResumeArgs),
}

/// Options shared by every command that sends a turn
#[derive(clap::Args, Debug, Default, Clone)]
pub struct TurnArgs {
    /// Conversation mode (defaults to chat.default_mode)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Response language (en, zh)
    #[arg(short, long)]
    pub locale: Option<Locale>,

    /// Attachment ids to reference (at most two)
    #[arg(long, num_args = 1..)]
    pub pillars: Vec<String>,

    /// Continue an existing session
    #[arg(long)]
    pub session: Option<String>,
}

impl TurnArgs {
    /// Attachments as sent on the wire; an empty list means none.
    pub fn attachments(&self) -> Option<Vec<String>> {
        (!self.pillars.is_empty()).then(|| self.pillars.clone())
    }
}

/// Arguments for the chat subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ChatArgs {
    #[command(flatten)]
    pub turn: TurnArgs,
}

/// Arguments for the ask subcommand
#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The message to send
    pub message: String,

    #[command(flatten)]
    pub turn: TurnArgs,
}

/// Arguments for the resume subcommand
#[derive(clap::Args, Debug)]
pub struct ResumeArgs {
    /// Session to resume
    #[arg(long)]
    pub session: String,

    /// Response language (en, zh)
    #[arg(short, long)]
    pub locale: Option<Locale>,
}
