// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use seer::chat::ControllerOptions;
use seer::config::Settings;
use seer::locale::Locale;
use tempfile::TempDir;

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.api.base_url, "http://localhost:8000");
    assert_eq!(settings.api.connect_timeout_secs, 10);
    assert!(settings.api.token.is_none());
    assert_eq!(settings.chat.title, "New conversation");
    assert_eq!(settings.chat.locale, Locale::En);
}

#[test]
fn test_load_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.json");

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("settings.json");

    let mut settings = Settings::default();
    settings.api.base_url = "https://chat.example.com".to_string();
    settings.chat.locale = Locale::Zh;
    settings.chat.default_mode = "fortune".to_string();
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_saved_file_is_pretty_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    Settings::default().save_to(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains('\n'));
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["api"]["chat_path"], "/api/chat/stream");
}

#[test]
fn test_load_rejects_invalid_settings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, r#"{"api": {"base_url": "localhost:8000"}}"#).unwrap();

    let err = Settings::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_load_rejects_malformed_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = Settings::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("JSON error"));
}

#[test]
fn test_bearer_token_priority() {
    // Use a custom env var name to avoid test pollution
    let mut settings = Settings::default();
    settings.api.token_env = "SEER_TEST_TOKEN_PRIORITY".to_string();
    settings.api.token = Some("config-token".to_string());

    std::env::remove_var("SEER_TEST_TOKEN_PRIORITY");
    assert_eq!(settings.bearer_token(), Some("config-token".to_string()));

    std::env::set_var("SEER_TEST_TOKEN_PRIORITY", "env-token");
    assert_eq!(settings.bearer_token(), Some("env-token".to_string()));

    std::env::remove_var("SEER_TEST_TOKEN_PRIORITY");
}

#[test]
fn test_no_token_anywhere() {
    let mut settings = Settings::default();
    settings.api.token_env = "SEER_TEST_TOKEN_UNSET".to_string();
    std::env::remove_var("SEER_TEST_TOKEN_UNSET");
    assert!(settings.bearer_token().is_none());
}

#[test]
fn test_controller_options_follow_chat_settings() {
    let mut settings = Settings::default();
    settings.chat.title = "Tarot".to_string();
    settings.chat.user_message_delay_ms = 0;

    let options = ControllerOptions::from(&settings.chat);
    assert_eq!(options.title, "Tarot");
    assert!(options.user_message_delay.is_zero());
}
