// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use clap::Parser;
use seer::cli::{Cli, Commands};
use seer::locale::Locale;

#[test]
fn test_parse_chat_command() {
    let args = vec!["seer", "chat"];
    let cli = Cli::try_parse_from(args).expect("Valid command parsing");
    assert!(matches!(cli.command, Some(Commands::Chat(_))));
}

#[test]
fn test_parse_chat_with_locale_aliases() {
    for alias in ["zh", "zh-CN", "zh_cn", "Chinese"] {
        let cli = Cli::try_parse_from(["seer", "chat", "--locale", alias])
            .expect("Valid command parsing");
        let Some(Commands::Chat(chat_args)) = cli.command else {
            panic!("Expected Chat command");
        };
        assert_eq!(chat_args.turn.locale, Some(Locale::Zh));
    }
}

#[test]
fn test_parse_ask_with_mode_and_session() {
    let cli = Cli::try_parse_from(["seer", "ask", "Hello", "-m", "fortune", "--session", "s1"])
        .expect("Valid command parsing");
    if let Some(Commands::Ask(ask_args)) = cli.command {
        assert_eq!(ask_args.message, "Hello");
        assert_eq!(ask_args.turn.mode.as_deref(), Some("fortune"));
        assert_eq!(ask_args.turn.session.as_deref(), Some("s1"));
    } else {
        panic!("Expected Ask command");
    }
}

#[test]
fn test_parse_resume() {
    let cli = Cli::try_parse_from(["seer", "resume", "--session", "abc", "--locale", "en"])
        .expect("Valid command parsing");
    if let Some(Commands::Resume(resume_args)) = cli.command {
        assert_eq!(resume_args.session, "abc");
        assert_eq!(resume_args.locale, Some(Locale::En));
    } else {
        panic!("Expected Resume command");
    }
}

#[test]
fn test_unknown_subcommand_fails() {
    assert!(Cli::try_parse_from(["seer", "history"]).is_err());
}
