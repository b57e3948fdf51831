// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Accumulation of the in-flight assistant message
//!
//! Upstream is inconsistent about chunking: some ticks carry a delta, some
//! resend the whole text so far, and some arrive doubled (`"abcabc"`). Every
//! text chunk is normalized first, then merged as a cumulative snapshot when it
//! extends the buffer and as a delta otherwise.

/// Collapse a string made of the same half twice, repeatedly.
///
/// Strings with an odd number of characters are returned unchanged.
pub fn normalize_duplicated(text: &str) -> &str {
    let mut current = text;
    loop {
        let chars = current.chars().count();
        if chars == 0 || chars % 2 != 0 {
            return current;
        }

        let mid = current
            .char_indices()
            .nth(chars / 2)
            .map_or(current.len(), |(idx, _)| idx);
        let (head, tail) = current.split_at(mid);
        if head != tail {
            return current;
        }
        current = head;
    }
}

/// Mutable state of one assistant turn
#[derive(Debug, Default)]
pub struct AccumulatorState {
    assistant_text: String,
    thinking_text: String,
    active_turn: Option<u64>,
}

impl AccumulatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any previous turn and start accumulating for `turn`.
    pub fn open(&mut self, turn: u64) {
        self.assistant_text.clear();
        self.thinking_text.clear();
        self.active_turn = Some(turn);
    }

    /// Discard everything; later chunks for any turn are stale.
    pub fn close(&mut self) {
        self.assistant_text.clear();
        self.thinking_text.clear();
        self.active_turn = None;
    }

    pub fn active_turn(&self) -> Option<u64> {
        self.active_turn
    }

    pub fn is_active(&self, turn: u64) -> bool {
        self.active_turn == Some(turn)
    }

    pub fn assistant_text(&self) -> &str {
        &self.assistant_text
    }

    pub fn thinking_text(&self) -> &str {
        &self.thinking_text
    }

    /// Merge a partial chunk and return the live text.
    pub fn apply_partial(&mut self, chunk: &str) -> &str {
        let chunk = normalize_duplicated(chunk);
        if chunk.starts_with(self.assistant_text.as_str()) {
            self.assistant_text.replace_range(.., chunk);
        } else {
            self.assistant_text.push_str(chunk);
        }
        &self.assistant_text
    }

    /// Merge the final chunk and return the authoritative text.
    ///
    /// Non-empty final text replaces the buffer; otherwise the buffer stands.
    pub fn apply_final(&mut self, chunk: Option<&str>) -> &str {
        if let Some(chunk) = chunk.map(normalize_duplicated).filter(|c| !c.is_empty()) {
            self.assistant_text.replace_range(.., chunk);
        }
        &self.assistant_text
    }

    /// Append thinking text and return the cumulative thinking.
    pub fn append_thinking(&mut self, delta: &str) -> &str {
        self.thinking_text.push_str(delta);
        &self.thinking_text
    }

    /// Take both buffers, leaving the turn open but empty.
    pub fn take(&mut self) -> (String, String) {
        (
            std::mem::take(&mut self.assistant_text),
            std::mem::take(&mut self.thinking_text),
        )
    }
}
