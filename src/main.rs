// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Seer - streaming chat client for your terminal
//!
//! Entry point for the Seer CLI application.

use clap::Parser;

use seer::cli::{ChatArgs, Cli, Commands};
use seer::config::Settings;
use seer::error::Result;

#[path = "main/chat_ui.rs"]
mod chat_ui;
#[path = "main/cli_commands.rs"]
mod cli_commands;

use cli_commands::{run_ask, run_chat, run_resume};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` enables stream diagnostics without requiring users to know target
    // names up front. `RUST_LOG` still takes precedence.
    if cli.verbose > 0 {
        for directive in [
            "seer.chat.controller=debug",
            "seer.chat.router=debug",
            "seer.transport=debug",
            "seer.config=debug",
        ] {
            if let Ok(parsed) = directive.parse() {
                env_filter = env_filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Load settings
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    // Dispatch to appropriate command
    let verbose = cli.verbose;
    match cli.command {
        None => run_chat(ChatArgs::default(), settings, verbose).await?,
        Some(Commands::Chat(args)) => run_chat(args, settings, verbose).await?,
        Some(Commands::Ask(args)) => run_ask(args, settings, verbose).await?,
        Some(Commands::Resume(args)) => run_resume(args, settings, verbose).await?,
    }

    Ok(())
}
