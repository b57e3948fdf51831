// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! UI locale and its protocol language code

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SeerError;

/// The two UI locales the product ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// Language code sent in the `language` request field
    pub fn language_code(self) -> &'static str {
        match self {
            Locale::En => "en_US",
            Locale::Zh => "zh_CN",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Zh => write!(f, "zh"),
        }
    }
}

impl FromStr for Locale {
    type Err = SeerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase().replace('-', "_");
        match lower.as_str() {
            "en" | "en_us" | "english" => Ok(Locale::En),
            "zh" | "zh_cn" | "chinese" => Ok(Locale::Zh),
            _ => Err(SeerError::InvalidInput(format!("unknown locale: {}", s))),
        }
    }
}

/// Supplies the current locale before each request
pub trait LocaleProvider: Send + Sync {
    fn locale(&self) -> Locale;
}

impl LocaleProvider for Locale {
    fn locale(&self) -> Locale {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Locale::En.language_code(), "en_US");
        assert_eq!(Locale::Zh.language_code(), "zh_CN");
    }

    #[test]
    fn test_parse() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("zh-CN".parse::<Locale>().unwrap(), Locale::Zh);
        assert_eq!("ZH_cn".parse::<Locale>().unwrap(), Locale::Zh);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_default_is_english() {
        assert_eq!(Locale::default(), Locale::En);
        assert_eq!(Locale::default().locale(), Locale::En);
    }

    #[test]
    fn test_serde_roundtrip_uses_short_tag() {
        assert_eq!(serde_json::to_string(&Locale::Zh).unwrap(), "\"zh\"");
    }
}
