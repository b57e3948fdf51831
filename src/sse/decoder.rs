// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Byte chunk to line decoding
//!
//! Network chunks can split both lines and multi-byte UTF-8 sequences. The
//! decoder holds back an incomplete trailing sequence until the next chunk
//! completes it, so the produced lines never depend on where the transport
//! happened to cut the body.

/// Incremental UTF-8 line decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Undecoded bytes (an incomplete UTF-8 sequence at the end of the last chunk)
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline
    line_buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, without the newline.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        self.pending.extend_from_slice(chunk);
        self.drain_pending(false);
        self.take_lines()
    }

    /// Flush whatever is left once the body ends.
    ///
    /// Returns the trailing unterminated line, if any. Bytes of an incomplete
    /// UTF-8 sequence are replaced with U+FFFD at this point.
    pub fn finish(&mut self) -> Option<String> {
        self.drain_pending(true);
        if self.line_buffer.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.line_buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Text decoded so far that is still waiting for its newline.
    pub fn partial_line(&self) -> &str {
        &self.line_buffer
    }

    fn drain_pending(&mut self, flush: bool) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.line_buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    // The prefix was validated by from_utf8 above.
                    self.line_buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));

                    match err.error_len() {
                        Some(invalid) => {
                            self.line_buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        None if flush => {
                            self.line_buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.clear();
                            return;
                        }
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn take_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.line_buffer.find('\n') {
            let mut line: String = self.line_buffer.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }
}
