//! # booksum-stream
//!
//! Turns a summarization response body into typed events.
//!
//! The backend streams newline-delimited JSON records over a single HTTP
//! response. Chunks arrive at arbitrary byte boundaries, so decoding is split
//! into stages that each own one concern:
//!
//! - [`decoder`]: stateful UTF-8 decoding across chunk boundaries
//! - [`splitter`]: record framing on `\n` with a pending tail
//! - [`message`]: record → [`SummaryEvent`] or [`ParseFailure`]
//! - [`pipeline`]: byte stream → lazy stream of complete records

#![deny(unsafe_code)]

pub mod decoder;
pub mod message;
pub mod pipeline;
pub mod splitter;

pub use decoder::Utf8FrameDecoder;
pub use message::{EventKind, ParseFailure, ParseReason, SummaryEvent, TokenCounts, parse_record};
pub use pipeline::{RecordStreamOptions, StreamError, record_stream};
pub use splitter::LineSplitter;
