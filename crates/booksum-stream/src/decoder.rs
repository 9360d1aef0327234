//! Stateful UTF-8 decoding of response chunks.
//!
//! HTTP chunk boundaries ignore character boundaries: a 3-byte character can
//! arrive as one byte in one chunk and two in the next. The decoder holds an
//! incomplete trailing sequence back until the rest arrives. Invalid bytes
//! become U+FFFD and decoding carries on.

use std::char::REPLACEMENT_CHARACTER;

use tracing::warn;

/// Incremental UTF-8 decoder for one response body.
#[derive(Debug, Default)]
pub struct Utf8FrameDecoder {
    /// Bytes of a multi-byte sequence cut off by the previous chunk (≤ 3).
    pending: Vec<u8>,
}

impl Utf8FrameDecoder {
    /// Create a decoder with no held-back bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk.
    ///
    /// Returns `None` when the chunk produced no text (empty, or only the
    /// start of a multi-byte character).
    pub fn decode(&mut self, chunk: &[u8]) -> Option<String> {
        let joined;
        let bytes: &[u8] = if self.pending.is_empty() {
            chunk
        } else {
            let mut buf = std::mem::take(&mut self.pending);
            buf.extend_from_slice(chunk);
            joined = buf;
            &joined
        };

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    // `valid` is exactly the prefix from_utf8 accepted
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        out.push_str(valid);
                    }
                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push(REPLACEMENT_CHARACTER);
                            rest = &tail[invalid_len..];
                        }
                        None => {
                            // Incomplete sequence at the end of input
                            self.pending.extend_from_slice(tail);
                            break;
                        }
                    }
                }
            }
        }

        (!out.is_empty()).then_some(out)
    }

    /// Flush at end of stream.
    ///
    /// A held-back incomplete sequence can never complete now, so it becomes a
    /// single U+FFFD.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        warn!(
            bytes = self.pending.len(),
            "stream ended inside a multi-byte character"
        );
        self.pending.clear();
        Some(REPLACEMENT_CHARACTER.to_string())
    }

    /// Number of bytes currently held back.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
