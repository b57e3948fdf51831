// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Server-Sent Events consumption
//!
//! Raw body bytes flow through [`FrameDecoder`] into lines and through
//! [`EventAssembler`] into `(event, payload)` pairs.

pub mod assembler;
pub mod decoder;

pub use assembler::{AssembledEvent, EventAssembler, SsePayload, DEFAULT_EVENT, DONE_SENTINEL};
pub use decoder::FrameDecoder;

/// Decoder and assembler state for one response body.
#[derive(Debug, Default)]
pub struct SseStream {
    decoder: FrameDecoder,
    assembler: EventAssembler,
}

impl SseStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk and return the events it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<AssembledEvent> {
        let lines = self.decoder.decode(chunk);
        lines
            .iter()
            .filter_map(|line| self.assembler.push_line(line))
            .collect()
    }

    /// Flush a trailing unterminated line once the body ends.
    pub fn finish(&mut self) -> Option<AssembledEvent> {
        let line = self.decoder.finish()?;
        self.assembler.push_line(&line)
    }

    pub fn current_event(&self) -> &str {
        self.assembler.current_event()
    }
}
