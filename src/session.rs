// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Session bookkeeping
//!
//! Tracks which server sessions this process has talked to. Only metadata is
//! kept; message history stays with the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::utils::lock_or_recover;

/// Metadata about one server session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Server-assigned session ID
    pub id: String,
    /// Conversation mode of the most recent turn
    pub mode: String,
    pub title: String,
    /// When the session first completed a turn
    pub started_at: DateTime<Utc>,
    /// When the session last completed a turn
    pub last_active: DateTime<Utc>,
    /// Completed turns
    pub turns: usize,
}

/// Where controllers record completed turns
pub trait SessionRepository: Send + Sync {
    /// Note a completed turn for `id`, creating the record if needed.
    fn record_turn(&self, id: &str, mode: &str, title: &str);

    fn get(&self, id: &str) -> Option<SessionRecord>;

    /// All records, most recently active first.
    fn list(&self) -> Vec<SessionRecord>;

    fn most_recent(&self) -> Option<SessionRecord> {
        self.list().into_iter().next()
    }
}

/// Process-local repository
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn record_turn(&self, id: &str, mode: &str, title: &str) {
        let now = Utc::now();
        let mut sessions = lock_or_recover(&self.sessions);
        let record = sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionRecord {
                id: id.to_string(),
                mode: mode.to_string(),
                title: title.to_string(),
                started_at: now,
                last_active: now,
                turns: 0,
            });
        record.mode = mode.to_string();
        record.last_active = now;
        record.turns += 1;
    }

    fn get(&self, id: &str) -> Option<SessionRecord> {
        lock_or_recover(&self.sessions).get(id).cloned()
    }

    fn list(&self) -> Vec<SessionRecord> {
        let mut records: Vec<_> = lock_or_recover(&self.sessions).values().cloned().collect();
        records.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        records
    }
}
