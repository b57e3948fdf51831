// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Configuration module for Seer
//!
//! Handles loading, saving, and validating user settings.

pub mod settings;

pub use settings::*;
