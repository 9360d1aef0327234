//! Session state.
//!
//! ```text
//!   upload / remove           start accepted         error | stop | end of stream
//! ────────────────▶ Idle ────────────────────▶ Summarizing ───────────────────────▶ Terminal(outcome)
//!                    ▲  start rejected              │                                    │
//!                    └──────────────────────────────┘      upload / remove / start       │
//!                    ◀──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The download control is enabled only by reaching `Terminal` with an
//! outcome other than [`Outcome::Errored`].

use booksum_stream::TokenCounts;

/// How an attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The stream ended without an error or stop.
    Completed,
    /// The backend (or the transport) reported a failure.
    Errored,
    /// The attempt was cancelled.
    Cancelled,
}

impl Outcome {
    /// Whether the rendered output may be exported after this outcome.
    pub fn allows_download(self) -> bool {
        !matches!(self, Self::Errored)
    }

    /// Lowercase name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Errored => "errored",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No attempt running and none finished since the last document change.
    Idle,
    /// An attempt is consuming the stream.
    Summarizing,
    /// The last attempt ended.
    Terminal(Outcome),
}

/// The document the backend currently holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Local file name, used for display and export.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Name the backend stored it under, if it reported one.
    pub stored_as: Option<String>,
}

/// Everything a client displays for one session.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub(crate) document: Option<DocumentInfo>,
    pub(crate) phase: Phase,
    pub(crate) rendered: String,
    pub(crate) tokens: TokenCounts,
    pub(crate) can_download: bool,
    pub(crate) cancel_requested: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            document: None,
            phase: Phase::Idle,
            rendered: String::new(),
            tokens: TokenCounts::default(),
            can_download: false,
            cancel_requested: false,
        }
    }
}

impl SessionState {
    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The uploaded document, if any.
    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    /// The rendered output region: the latest `main` content, or the error
    /// or stop notice that ended the attempt.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Latest token monitors.
    pub fn tokens(&self) -> TokenCounts {
        self.tokens
    }

    /// Whether the rendered output may be exported.
    pub fn can_download(&self) -> bool {
        self.can_download
    }

    /// Whether a cancel was requested during the current or last attempt.
    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    /// Whether a new attempt may start.
    pub fn can_start(&self) -> bool {
        self.document.is_some() && self.phase != Phase::Summarizing
    }

    /// The outcome of the last attempt, once it has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub(crate) fn begin_attempt(&mut self) {
        self.phase = Phase::Summarizing;
        self.rendered.clear();
        self.tokens = TokenCounts::default();
        self.can_download = false;
        self.cancel_requested = false;
    }

    /// Start was rejected: back to `Idle` with nothing exportable.
    pub(crate) fn abandon_attempt(&mut self) {
        self.phase = Phase::Idle;
        self.can_download = false;
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::Terminal(outcome);
        self.can_download = outcome.allows_download();
    }

    /// Replace the rendered output. Returns `false` when it was unchanged.
    pub(crate) fn render(&mut self, content: String) -> bool {
        if self.rendered == content {
            return false;
        }
        self.rendered = content;
        true
    }

    pub(crate) fn set_document(&mut self, document: DocumentInfo) {
        self.document = Some(document);
        self.phase = Phase::Idle;
        self.can_download = false;
    }

    pub(crate) fn clear_document(&mut self) {
        self.document = None;
        self.phase = Phase::Idle;
        self.can_download = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentInfo {
        DocumentInfo {
            name: "book.txt".into(),
            size: 12,
            stored_as: None,
        }
    }

    #[test]
    fn fresh_state_cannot_start() {
        let state = SessionState::default();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.can_start());
        assert!(!state.can_download());
        assert_eq!(state.outcome(), None);
    }

    #[test]
    fn begin_clears_previous_output() {
        let mut state = SessionState::default();
        state.set_document(doc());
        state.rendered = "old".into();
        state.tokens = TokenCounts {
            tokens_in: 1,
            tokens_out: 2,
        };
        state.finish(Outcome::Completed);
        assert!(state.can_download());

        state.begin_attempt();
        assert_eq!(state.phase(), Phase::Summarizing);
        assert_eq!(state.rendered(), "");
        assert_eq!(state.tokens(), TokenCounts::default());
        assert!(!state.can_download());
        assert!(!state.can_start());
    }

    #[test]
    fn errored_outcome_hides_download() {
        let mut state = SessionState::default();
        state.set_document(doc());
        state.begin_attempt();
        state.finish(Outcome::Errored);
        assert!(!state.can_download());
        assert!(state.can_start());
        assert_eq!(state.outcome(), Some(Outcome::Errored));
    }

    #[test]
    fn cancelled_outcome_allows_download() {
        assert!(Outcome::Cancelled.allows_download());
        assert!(Outcome::Completed.allows_download());
        assert!(!Outcome::Errored.allows_download());
    }

    #[test]
    fn render_reports_changes_only() {
        let mut state = SessionState::default();
        assert!(state.render("A".into()));
        assert!(!state.render("A".into()));
        assert!(state.render("AB".into()));
        assert_eq!(state.rendered(), "AB");
    }

    #[test]
    fn clearing_document_returns_to_idle() {
        let mut state = SessionState::default();
        state.set_document(doc());
        state.begin_attempt();
        state.finish(Outcome::Completed);
        state.clear_document();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.document().is_none());
        assert!(!state.can_download());
    }
}
