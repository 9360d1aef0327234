//! Record parsing.
//!
//! Each record is a JSON object `{"type": <kind>, "content": <payload>}`.
//! `main`, `error` and `stop` carry a renderable HTML fragment; `tokens`
//! carries a second JSON document (usually encoded as a string) with the
//! running token counts. Parsing is two-layered so that a bad token payload
//! is reported separately from a bad record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Running token usage reported by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCounts {
    /// Prompt tokens consumed so far.
    pub tokens_in: u64,
    /// Completion tokens produced so far.
    pub tokens_out: u64,
}

/// The fixed set of record kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Latest full rendering of the summary.
    Main,
    /// Token usage update.
    Tokens,
    /// Backend failure; ends the attempt.
    Error,
    /// Cancellation confirmed; ends the attempt.
    Stop,
}

impl EventKind {
    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Tokens => "tokens",
            Self::Error => "error",
            Self::Stop => "stop",
        }
    }

    fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "main" => Some(Self::Main),
            "tokens" => Some(Self::Tokens),
            "error" => Some(Self::Error),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed stream event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SummaryEvent {
    /// Replace the rendered summary with `content`.
    Main {
        /// Full HTML rendering.
        content: String,
    },
    /// Overwrite the token monitors.
    Tokens(TokenCounts),
    /// Render `content` as the failure message and end the attempt.
    Error {
        /// HTML error fragment.
        content: String,
    },
    /// Render `content` as the cancellation notice and end the attempt.
    Stop {
        /// HTML notice fragment.
        content: String,
    },
}

impl SummaryEvent {
    /// The record kind this event came from.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Main { .. } => EventKind::Main,
            Self::Tokens(_) => EventKind::Tokens,
            Self::Error { .. } => EventKind::Error,
            Self::Stop { .. } => EventKind::Stop,
        }
    }

    /// Whether this event ends the attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Stop { .. })
    }
}

/// Why a record was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseReason {
    /// Not JSON, not an object, or missing/mistyped `type` or `content`.
    #[error("malformed record: {0}")]
    Malformed(String),
    /// `type` is not one of the known kinds.
    #[error("unknown record kind {0:?}")]
    UnknownKind(String),
    /// The nested `tokens` payload could not be decoded.
    #[error("invalid tokens payload: {0}")]
    InvalidTokens(String),
}

/// A rejected record. Never fatal to the stream.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ParseFailure {
    /// The offending record, verbatim.
    pub record: String,
    /// What was wrong with it.
    pub reason: ParseReason,
}

impl ParseFailure {
    fn new(record: &str, reason: ParseReason) -> Self {
        Self {
            record: record.to_owned(),
            reason,
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    kind: String,
    content: Option<Value>,
}

/// Parse one record.
///
/// Blank or whitespace-only records yield `Ok(None)`.
pub fn parse_record(record: &str) -> Result<Option<SummaryEvent>, ParseFailure> {
    if record.trim().is_empty() {
        return Ok(None);
    }

    let raw: RawRecord = serde_json::from_str(record)
        .map_err(|e| ParseFailure::new(record, ParseReason::Malformed(e.to_string())))?;

    let Some(kind) = EventKind::from_wire(&raw.kind) else {
        return Err(ParseFailure::new(record, ParseReason::UnknownKind(raw.kind)));
    };

    let Some(content) = raw.content else {
        return Err(ParseFailure::new(
            record,
            ParseReason::Malformed("missing field `content`".into()),
        ));
    };

    let event = match kind {
        EventKind::Tokens => SummaryEvent::Tokens(
            decode_tokens(content).map_err(|reason| ParseFailure::new(record, reason))?,
        ),
        EventKind::Main => SummaryEvent::Main {
            content: text_content(kind, content).map_err(|r| ParseFailure::new(record, r))?,
        },
        EventKind::Error => SummaryEvent::Error {
            content: text_content(kind, content).map_err(|r| ParseFailure::new(record, r))?,
        },
        EventKind::Stop => SummaryEvent::Stop {
            content: text_content(kind, content).map_err(|r| ParseFailure::new(record, r))?,
        },
    };
    Ok(Some(event))
}

fn text_content(kind: EventKind, content: Value) -> Result<String, ParseReason> {
    match content {
        Value::String(s) => Ok(s),
        other => Err(ParseReason::Malformed(format!(
            "`{kind}` content must be a string, got {}",
            json_type(&other)
        ))),
    }
}

/// Inner decode of a `tokens` payload.
///
/// The backend double-encodes it as a JSON string; a bare object is accepted
/// too.
fn decode_tokens(content: Value) -> Result<TokenCounts, ParseReason> {
    let decoded = match content {
        Value::String(s) => serde_json::from_str(&s),
        obj @ Value::Object(_) => serde_json::from_value(obj),
        other => {
            return Err(ParseReason::InvalidTokens(format!(
                "expected string or object, got {}",
                json_type(&other)
            )));
        }
    };
    decoded.map_err(|e| ParseReason::InvalidTokens(e.to_string()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
