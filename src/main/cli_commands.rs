// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;

use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};

use seer::auth::StaticCredentials;
use seer::chat::{ChatController, ControllerOptions, TurnOutcome};
use seer::cli::{AskArgs, ChatArgs, ResumeArgs, TurnArgs};
use seer::config::Settings;
use seer::error::Result;
use seer::locale::Locale;
use seer::session::InMemorySessionRepository;
use seer::transport::HttpTransport;
use seer::utils;

use super::chat_ui::{print_error, print_response_prefix, TerminalObserver};

/// Build a controller wired to the HTTP transport and the terminal.
fn build_controller(
    settings: &Settings,
    locale: Option<Locale>,
    session: Option<String>,
    observer: Arc<TerminalObserver>,
) -> Result<ChatController> {
    let transport = HttpTransport::from_settings(settings)?;
    let credentials = StaticCredentials::new(settings.bearer_token());
    let locale = locale.unwrap_or(settings.chat.locale);

    let mut controller = ChatController::new(Arc::new(transport), Arc::new(credentials), observer)
        .with_locale(Arc::new(locale))
        .with_options(ControllerOptions::from(&settings.chat))
        .with_session_repository(Arc::new(InMemorySessionRepository::new()));
    if let Some(session) = session {
        controller = controller.with_session(session);
    }
    Ok(controller)
}

/// Drive one turn; Ctrl-C disconnects it instead of killing the process.
async fn run_interruptible<F>(controller: &ChatController, turn: F) -> TurnOutcome
where
    F: Future<Output = TurnOutcome>,
{
    tokio::pin!(turn);
    tokio::select! {
        outcome = &mut turn => outcome,
        _ = tokio::signal::ctrl_c() => {
            controller.disconnect();
            turn.await
        }
    }
}

fn mode_for(args: &TurnArgs, settings: &Settings) -> String {
    args.mode
        .clone()
        .unwrap_or_else(|| settings.chat.default_mode.clone())
}

/// Interactive chat loop
pub(super) async fn run_chat(args: ChatArgs, settings: Settings, verbose: u8) -> Result<()> {
    let observer = Arc::new(TerminalObserver::new());
    let controller = build_controller(
        &settings,
        args.turn.locale,
        args.turn.session.clone(),
        observer.clone(),
    )?;
    let mode = mode_for(&args.turn, &settings);

    if verbose > 0 {
        eprintln!(
            "[verbose] chat mode '{}' against {}",
            mode,
            settings.base_url()
        );
    }
    print_welcome()?;

    loop {
        let Some(input) = read_user_input()? else {
            break;
        };
        if input.is_empty() {
            continue;
        }
        if utils::is_exit_command(&input) {
            break;
        }

        let outcome = match utils::parse_slash_command(&input) {
            Some(("retry", _)) => {
                print_response_prefix()?;
                let history = observer.history();
                run_interruptible(&controller, controller.retry_last_message(&history)).await
            }
            Some(("resume", _)) => {
                print_response_prefix()?;
                run_interruptible(&controller, controller.resume_conversation()).await
            }
            Some(("help", _)) => {
                print_help()?;
                continue;
            }
            Some((command, _)) => {
                print_error(&format!("Unknown command: /{}", command))?;
                continue;
            }
            None => {
                print_response_prefix()?;
                let turn = controller.send(&input, &mode, args.turn.attachments(), false);
                run_interruptible(&controller, turn).await
            }
        };

        match outcome {
            TurnOutcome::Aborted => {
                observer.reset_stream();
                eprintln!("(interrupted)");
            }
            TurnOutcome::Skipped => {
                println!();
                print_error("Nothing to retry or resume yet.")?;
            }
            TurnOutcome::Completed { .. } | TurnOutcome::Errored(_) => {}
        }
    }

    Ok(())
}

/// Send one message, print the answer, and exit non-zero on failure
pub(super) async fn run_ask(args: AskArgs, settings: Settings, verbose: u8) -> Result<()> {
    let observer = Arc::new(TerminalObserver::new());
    let controller = build_controller(
        &settings,
        args.turn.locale,
        args.turn.session.clone(),
        observer.clone(),
    )?;
    let mode = mode_for(&args.turn, &settings);

    if verbose > 0 {
        eprintln!("[verbose] asking in mode '{}'", mode);
    }

    let turn = controller.send(&args.message, &mode, args.turn.attachments(), false);
    let outcome = run_interruptible(&controller, turn).await;
    finish_one_shot(outcome)
}

/// Replay an interrupted turn
pub(super) async fn run_resume(args: ResumeArgs, settings: Settings, verbose: u8) -> Result<()> {
    let observer = Arc::new(TerminalObserver::new());
    let controller = build_controller(&settings, args.locale, Some(args.session), observer)?;

    if verbose > 0 {
        eprintln!("[verbose] resuming session {:?}", controller.session_id());
    }

    let outcome = run_interruptible(&controller, controller.resume_conversation()).await;
    finish_one_shot(outcome)
}

fn finish_one_shot(outcome: TurnOutcome) -> Result<()> {
    match outcome {
        TurnOutcome::Completed { session_id } => {
            if let Some(id) = session_id {
                tracing::info!(target: "seer.cli", session_id = %id, "session");
            }
            Ok(())
        }
        // The observer has already printed the error.
        TurnOutcome::Errored(_) => std::process::exit(1),
        TurnOutcome::Aborted => std::process::exit(130),
        TurnOutcome::Skipped => Ok(()),
    }
}

fn print_welcome() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Cyan))?;
    println!("seer {}", env!("CARGO_PKG_VERSION"));
    stdout.execute(ResetColor)?;
    println!("Type a message, /help for commands, /quit to exit.");
    Ok(())
}

fn print_help() -> Result<()> {
    println!("  /retry   send the last message again");
    println!("  /resume  continue an interrupted answer");
    println!("  /quit    exit");
    println!("  Ctrl-C   stop the current answer");
    Ok(())
}

/// Read one line; `None` at end of input.
fn read_user_input() -> Result<Option<String>> {
    let mut stdout = io::stdout();
    stdout.execute(SetForegroundColor(Color::Green))?;
    print!("\nyou: ");
    stdout.execute(ResetColor)?;
    stdout.flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}
