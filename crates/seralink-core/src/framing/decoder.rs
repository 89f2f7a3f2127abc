//! Streaming COBS frame decoder.
//!
//! Stateful accumulator that consumes raw link bytes and extracts complete
//! decoded frames. Decode state survives arbitrary splits of the input, so
//! a frame may arrive one byte at a time across many reads.
//!
//! Recovery policy: a zero byte appearing inside a chunk (stray delimiter)
//! ends the frame early and whatever decoded so far is forwarded as a
//! partial payload, best effort over a noisy link. Empty frames
//! (delimiter immediately after delimiter) are discarded, which also makes
//! the opening delimiter of the very first frame invisible.

extern crate alloc;
use alloc::vec::Vec;

use crate::error::FramingError;
use crate::framing::cobs::{DELIMITER, OVERHEAD_MAX};

/// Streaming COBS decoder.
///
/// `remaining == 0` means the next byte is an overhead byte; otherwise
/// `remaining - 1` more literal bytes belong to the current chunk.
/// `append_zero` records whether the previous chunk implies a zero before
/// the next chunk's literals (suppressed after an [`OVERHEAD_MAX`] chunk).
pub struct CobsDecoder {
    remaining: u8,
    append_zero: bool,
    buf: Vec<u8>,
    capacity: usize,
    /// Set when the current frame outgrew `capacity`; bytes are skipped
    /// until the next delimiter resynchronizes the decoder.
    discarding: bool,
}

impl CobsDecoder {
    /// Create a decoder with an accumulation buffer of `capacity` bytes.
    ///
    /// A well-behaved peer never sends a frame whose decoded payload
    /// exceeds `max_message_size(capacity)`; larger frames are discarded.
    pub fn new(capacity: usize) -> Self {
        Self {
            remaining: 0,
            append_zero: false,
            buf: Vec::with_capacity(capacity),
            capacity,
            discarding: false,
        }
    }

    /// Feed raw bytes from the link and extract all complete frames.
    ///
    /// Returns the decoded payloads in arrival order. Empty frames are
    /// discarded, never forwarded.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &byte in data {
            if self.discarding {
                if byte == DELIMITER {
                    self.reset();
                }
                continue;
            }

            if self.remaining == 0 {
                self.on_overhead(byte, &mut frames);
            } else if byte == DELIMITER {
                // Stray delimiter inside a chunk: forward the partial
                // payload and resynchronize.
                self.finish(&mut frames);
            } else {
                self.push(byte);
                self.remaining -= 1;
            }
        }
        frames
    }

    fn on_overhead(&mut self, byte: u8, frames: &mut Vec<Vec<u8>>) {
        if byte == DELIMITER {
            self.finish(frames);
            return;
        }
        if self.append_zero {
            self.push(0);
        }
        self.append_zero = byte != OVERHEAD_MAX;
        self.remaining = byte - 1;
    }

    fn push(&mut self, byte: u8) {
        if self.buf.len() >= self.capacity {
            // Peer exceeded the advertised buffer; skip to the next frame.
            self.buf.clear();
            self.discarding = true;
            return;
        }
        self.buf.push(byte);
    }

    fn finish(&mut self, frames: &mut Vec<Vec<u8>>) {
        if !self.buf.is_empty() {
            frames.push(core::mem::take(&mut self.buf));
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.remaining = 0;
        self.append_zero = false;
        self.discarding = false;
    }
}

/// Decode one complete frame (with delimiters) back into its payload.
///
/// # Errors
///
/// Returns [`FramingError::MissingDelimiter`] if the input does not start
/// with a delimiter, and [`FramingError::TruncatedFrame`] if it ends before
/// the closing delimiter completes a frame.
pub fn cobs_unframe(framed: &[u8]) -> Result<Vec<u8>, FramingError> {
    if framed.first() != Some(&DELIMITER) {
        return Err(FramingError::MissingDelimiter);
    }
    let mut decoder = CobsDecoder::new(framed.len());
    let mut frames = decoder.feed(framed);
    if frames.is_empty() {
        return Err(FramingError::TruncatedFrame);
    }
    Ok(frames.remove(0))
}
