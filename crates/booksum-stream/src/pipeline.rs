//! Byte stream → record stream.
//!
//! Chains the [`Utf8FrameDecoder`] and [`LineSplitter`] over a response body
//! and yields complete records lazily, one per poll. Records that arrive in
//! the same chunk are still yielded one at a time and in order, so the
//! consumer can stop between any two of them.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::decoder::Utf8FrameDecoder;
use crate::splitter::LineSplitter;

/// Errors surfaced by the record stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Reading the underlying body failed. The stream ends after this item.
    #[error("stream read failed: {message}")]
    Transport {
        /// Error description from the transport.
        message: String,
    },
}

/// Options for [`record_stream`].
#[derive(Clone, Debug)]
pub struct RecordStreamOptions {
    /// Log a warning when the body ends inside an unterminated record.
    pub warn_on_truncated_record: bool,
    /// Initial capacity of the pending buffer.
    pub buffer_capacity: usize,
}

impl Default for RecordStreamOptions {
    fn default() -> Self {
        Self {
            warn_on_truncated_record: true,
            buffer_capacity: 8192,
        }
    }
}

struct Framing<S> {
    body: S,
    decoder: Utf8FrameDecoder,
    splitter: LineSplitter,
    ready: VecDeque<String>,
    finished: bool,
}

/// Turn a response body into a stream of complete records.
///
/// Each item is one record without its delimiter (blank records included).
/// A transport error is yielded once and ends the stream; an unterminated
/// tail at end of body is discarded and, if configured, logged.
pub fn record_stream<S, E>(
    body: S,
    options: &RecordStreamOptions,
) -> impl Stream<Item = Result<String, StreamError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let warn_on_truncated = options.warn_on_truncated_record;
    let framing = Framing {
        body,
        decoder: Utf8FrameDecoder::new(),
        splitter: LineSplitter::with_capacity(options.buffer_capacity),
        ready: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(framing, move |mut f| async move {
        loop {
            if let Some(record) = f.ready.pop_front() {
                return Some((Ok(record), f));
            }
            if f.finished {
                return None;
            }

            match f.body.next().await {
                Some(Ok(chunk)) => {
                    if let Some(text) = f.decoder.decode(&chunk) {
                        f.ready.extend(f.splitter.feed(&text));
                    }
                }
                Some(Err(e)) => {
                    f.finished = true;
                    let message = e.to_string();
                    warn!(error = %message, pending = f.splitter.pending().len(), "summary stream read error");
                    return Some((Err(StreamError::Transport { message }), f));
                }
                None => {
                    f.finished = true;
                    if let Some(text) = f.decoder.finish() {
                        f.ready.extend(f.splitter.feed(&text));
                    }
                    if let Some(tail) = f.splitter.finish() {
                        if warn_on_truncated {
                            warn!(
                                bytes = tail.len(),
                                preview = %booksum_core::text::preview(&tail, 80),
                                "summary stream ended inside a record; discarding it"
                            );
                        } else {
                            debug!(bytes = tail.len(), "discarding truncated final record");
                        }
                    }
                }
            }
        }
    })
}
