// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Line to event assembly
//!
//! The chat protocol sends one `data:` line per event. An `event:` line names
//! every following data line until another `event:` line replaces it, even
//! across chunk boundaries, so the current name lives in the assembler rather
//! than in any single decode call.

/// Event name used until the stream declares one.
pub const DEFAULT_EVENT: &str = "message";

/// Terminal sentinel payload.
pub const DONE_SENTINEL: &str = "[DONE]";

const EVENT_MARKER: &str = "event:";
const DATA_MARKER: &str = "data:";

/// Payload of an assembled event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsePayload {
    /// The `[DONE]` sentinel; never parsed as JSON
    Done,
    /// Raw data text (JSON in this protocol)
    Data(String),
}

/// One `(event-name, payload)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledEvent {
    pub event: String,
    pub payload: SsePayload,
}

impl AssembledEvent {
    pub fn is_done(&self) -> bool {
        matches!(self.payload, SsePayload::Done)
    }
}

/// Stateful SSE line assembler with a sticky event name.
#[derive(Debug)]
pub struct EventAssembler {
    current_event: String,
}

impl Default for EventAssembler {
    fn default() -> Self {
        Self {
            current_event: DEFAULT_EVENT.to_string(),
        }
    }
}

impl EventAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name applied to the next data line.
    pub fn current_event(&self) -> &str {
        &self.current_event
    }

    /// Consume one decoded line, emitting an event for every data line.
    ///
    /// Blank lines, comments, and other SSE fields (`id:`, `retry:`) are ignored.
    pub fn push_line(&mut self, line: &str) -> Option<AssembledEvent> {
        if let Some(name) = line.strip_prefix(EVENT_MARKER) {
            let name = name.trim();
            self.current_event = if name.is_empty() {
                DEFAULT_EVENT.to_string()
            } else {
                name.to_string()
            };
            return None;
        }

        let data = line.strip_prefix(DATA_MARKER)?.trim();
        let payload = if data == DONE_SENTINEL {
            SsePayload::Done
        } else {
            SsePayload::Data(data.to_string())
        };

        Some(AssembledEvent {
            event: self.current_event.clone(),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_event_name() {
        let mut assembler = EventAssembler::new();
        let event = assembler.push_line("data: {\"x\":1}").unwrap();
        assert_eq!(event.event, "message");
        assert_eq!(event.payload, SsePayload::Data("{\"x\":1}".to_string()));
    }

    #[test]
    fn test_event_name_is_sticky() {
        let mut assembler = EventAssembler::new();
        assert!(assembler.push_line("event: thinking").is_none());
        assert!(assembler.push_line("").is_none());

        let first = assembler.push_line("data: {}").unwrap();
        let second = assembler.push_line("data: {}").unwrap();
        assert_eq!(first.event, "thinking");
        assert_eq!(second.event, "thinking");

        assembler.push_line("event: message");
        assert_eq!(assembler.push_line("data: {}").unwrap().event, "message");
    }

    #[test]
    fn test_marker_without_space() {
        let mut assembler = EventAssembler::new();
        assembler.push_line("event:limit_reached");
        let event = assembler.push_line("data:{}").unwrap();
        assert_eq!(event.event, "limit_reached");
        assert_eq!(event.payload, SsePayload::Data("{}".to_string()));
    }

    #[test]
    fn test_done_sentinel() {
        let mut assembler = EventAssembler::new();
        let event = assembler.push_line("data: [DONE]").unwrap();
        assert!(event.is_done());
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        let mut assembler = EventAssembler::new();
        assert!(assembler.push_line(": keep-alive").is_none());
        assert!(assembler.push_line("id: 42").is_none());
        assert!(assembler.push_line("retry: 1000").is_none());
        assert_eq!(assembler.current_event(), DEFAULT_EVENT);
    }

    #[test]
    fn test_empty_event_name_resets_to_default() {
        let mut assembler = EventAssembler::new();
        assembler.push_line("event: thinking");
        assembler.push_line("event:");
        assert_eq!(assembler.current_event(), DEFAULT_EVENT);
    }
}
