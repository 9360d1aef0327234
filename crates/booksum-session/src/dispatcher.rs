//! Event dispatch: one parsed event in, one state change out.

use tracing::{debug, error, warn};

use booksum_core::text::preview;
use booksum_stream::{ParseFailure, ParseReason, SummaryEvent};

use crate::observer::SessionObserver;
use crate::state::{Outcome, SessionState};

/// Bytes of a rejected record included in its log line.
const PREVIEW_BYTES: usize = 120;

/// Whether the consumer should keep reading after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading.
    Continue,
    /// The attempt has ended with this outcome; read nothing further.
    Terminal(Outcome),
}

/// Apply `event` to `state` and notify `observer` of what changed.
pub fn dispatch(
    event: SummaryEvent,
    state: &mut SessionState,
    observer: &mut dyn SessionObserver,
) -> Flow {
    match event {
        SummaryEvent::Main { content } => {
            render(state, observer, content);
            Flow::Continue
        }
        SummaryEvent::Tokens(tokens) => {
            state.tokens = tokens;
            observer.on_tokens(tokens);
            Flow::Continue
        }
        SummaryEvent::Error { content } => {
            debug!("summary stream reported an error");
            Flow::Terminal(settle(state, observer, Outcome::Errored, content))
        }
        SummaryEvent::Stop { content } => {
            debug!("summary stream confirmed stop");
            Flow::Terminal(settle(state, observer, Outcome::Cancelled, content))
        }
    }
}

/// Log a record that failed to parse. The stream carries on.
pub fn report_rejected(failure: &ParseFailure) {
    let record = preview(&failure.record, PREVIEW_BYTES);
    match &failure.reason {
        ParseReason::Malformed(detail) => {
            error!(%record, detail = %detail, "malformed summary record");
        }
        ParseReason::UnknownKind(kind) => {
            warn!(%record, kind = %kind, "unknown summary record kind");
        }
        ParseReason::InvalidTokens(detail) => {
            warn!(%record, detail = %detail, "invalid token counts payload");
        }
    }
}

fn render(state: &mut SessionState, observer: &mut dyn SessionObserver, content: String) {
    if state.render(content) {
        observer.on_render(state.rendered());
    }
}

/// Render `notice` and end the attempt with `outcome`.
pub(crate) fn settle(
    state: &mut SessionState,
    observer: &mut dyn SessionObserver,
    outcome: Outcome,
    notice: String,
) -> Outcome {
    render(state, observer, notice);
    state.finish(outcome);
    observer.on_phase(state.phase());
    outcome
}
