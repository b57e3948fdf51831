// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Seer - streaming chat client engine.
//!
//! This crate exposes the runtime used by the `seer` CLI (`src/main.rs`):
//! - `sse`: byte-chunk to line decoding and SSE event assembly
//! - `chat`: event routing, message accumulation, error classification and
//!   the per-conversation lifecycle controller
//! - `transport`: the HTTP transport and a scripted one for tests
//! - `auth`, `locale`, `session`: collaborator boundaries
//! - `config`: settings loaded from `~/.seer/settings.json`

pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod locale;
pub mod session;
pub mod sse;
pub mod transport;
pub mod utils;

pub use error::{Result, SeerError};
