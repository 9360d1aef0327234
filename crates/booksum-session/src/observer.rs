//! Presentation hooks.

use booksum_stream::TokenCounts;

use crate::state::Phase;

/// Receives display updates as a session progresses.
///
/// All methods default to no-ops.
pub trait SessionObserver: Send {
    /// The lifecycle phase changed.
    fn on_phase(&mut self, _phase: Phase) {}

    /// The rendered output region changed to `html`.
    fn on_render(&mut self, _html: &str) {}

    /// The token monitors changed.
    fn on_tokens(&mut self, _tokens: TokenCounts) {}

    /// A user-facing notice outside the rendered region (e.g. start refused).
    fn on_notice(&mut self, _message: &str) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {}
