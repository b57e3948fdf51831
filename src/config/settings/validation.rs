// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{Result, SeerError};

use super::Settings;

impl Settings {
    /// Get the bearer token, checking the env var first.
    pub fn bearer_token(&self) -> Option<String> {
        // Priority: env var > config file.
        std::env::var(&self.api.token_env)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.api.token.clone())
    }

    /// Get the API base URL, checking env var first.
    pub fn base_url(&self) -> String {
        // Priority: env var > config file.
        std::env::var("SEER_BASE_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.api.base_url.clone())
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(SeerError::Config(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }

        for (name, path) in [
            ("api.chat_path", &self.api.chat_path),
            ("api.resume_path", &self.api.resume_path),
        ] {
            if !path.starts_with('/') {
                return Err(SeerError::Config(format!(
                    "{} must start with '/', got '{}'",
                    name, path
                )));
            }
        }

        if self.chat.default_mode.trim().is_empty() {
            return Err(SeerError::Config("chat.default_mode must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let mut settings = Settings::default();
        settings.api.base_url = "ftp://example.com".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("api.base_url"));
    }

    #[test]
    fn test_rejects_relative_path() {
        let mut settings = Settings::default();
        settings.api.resume_path = "api/chat/resume".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("api.resume_path"));
    }

    #[test]
    fn test_rejects_empty_path() {
        let mut settings = Settings::default();
        settings.api.chat_path = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_inline_token_used_when_env_missing() {
        let mut settings = Settings::default();
        settings.api.token_env = "SEER_TEST_TOKEN_THAT_IS_NOT_SET".to_string();
        settings.api.token = Some("inline".to_string());
        assert_eq!(settings.bearer_token(), Some("inline".to_string()));
    }
}
