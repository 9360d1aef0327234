//! Terminal presentation of a running session.

use std::io::Write;

use booksum_session::{Phase, SessionObserver};
use booksum_stream::TokenCounts;
use tracing::debug;

/// Shows the token monitor on stderr; the rendering itself is printed once
/// the attempt ends.
#[derive(Debug, Default)]
pub struct TerminalObserver {
    monitor_open: bool,
}

impl TerminalObserver {
    /// Terminate the token monitor line, if one is showing.
    pub fn finish_line(&mut self) {
        if std::mem::take(&mut self.monitor_open) {
            eprintln!();
        }
    }
}

pub(crate) fn monitor_line(tokens: TokenCounts) -> String {
    format!("tokens in: {}  out: {}", tokens.tokens_in, tokens.tokens_out)
}

impl SessionObserver for TerminalObserver {
    fn on_phase(&mut self, phase: Phase) {
        debug!(?phase, "phase changed");
    }

    fn on_render(&mut self, html: &str) {
        debug!(bytes = html.len(), "summary updated");
    }

    fn on_tokens(&mut self, tokens: TokenCounts) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", monitor_line(tokens));
        let _ = stderr.flush();
        self.monitor_open = true;
    }

    fn on_notice(&mut self, message: &str) {
        self.finish_line();
        eprintln!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_line_format() {
        let line = monitor_line(TokenCounts {
            tokens_in: 1200,
            tokens_out: 85,
        });
        assert_eq!(line, "tokens in: 1200  out: 85");
    }

    #[test]
    fn finish_line_only_after_tokens() {
        let mut obs = TerminalObserver::default();
        obs.finish_line();
        assert!(!obs.monitor_open);
        obs.on_tokens(TokenCounts::default());
        assert!(obs.monitor_open);
        obs.finish_line();
        assert!(!obs.monitor_open);
    }
}
