//! Record framing on newline boundaries.
//!
//! The splitter owns the pending buffer: text received but not yet ending in
//! `\n`. After every [`LineSplitter::feed`] the buffer holds no delimiter, so
//! joining the emitted records with `\n` and appending the buffer gives back
//! exactly the text fed in.

/// Record delimiter.
pub const DELIMITER: char = '\n';

/// Splits decoded text into complete records.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: String,
}

impl LineSplitter {
    /// Create a splitter with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a splitter whose buffer starts with `capacity` bytes reserved.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: String::with_capacity(capacity),
        }
    }

    /// Append `text` and return every record it completed, in order.
    ///
    /// Records are returned without their delimiter. Empty records (two
    /// delimiters in a row) are returned as empty strings; dropping them is
    /// the parser's job.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.pending.push_str(text);

        let Some(last) = self.pending.rfind(DELIMITER) else {
            return Vec::new();
        };

        let tail = self.pending.split_off(last + DELIMITER.len_utf8());
        let complete = std::mem::replace(&mut self.pending, tail);
        let body = &complete[..complete.len() - DELIMITER.len_utf8()];
        body.split(DELIMITER).map(str::to_owned).collect()
    }

    /// The unterminated text held so far.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// End of stream: take the unterminated tail, if any.
    ///
    /// The tail is a truncated record, never a record in its own right.
    pub fn finish(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.pending);
        (!tail.is_empty()).then_some(tail)
    }

    /// Drop buffered text ahead of a new attempt.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn single_complete_record() {
        let mut s = LineSplitter::new();
        assert_eq!(s.feed("{\"a\":1}\n"), vec!["{\"a\":1}"]);
        assert_eq!(s.pending(), "");
    }

    #[test]
    fn multiple_records_in_one_feed() {
        let mut s = LineSplitter::new();
        assert_eq!(s.feed("a\nb\nc"), vec!["a", "b"]);
        assert_eq!(s.pending(), "c");
    }

    #[test]
    fn record_split_across_feeds() {
        let mut s = LineSplitter::new();
        assert!(s.feed("{\"type\":\"ma").is_empty());
        assert!(s.feed("in\",").is_empty());
        assert_eq!(
            s.feed("\"content\":\"A\"}\n{"),
            vec!["{\"type\":\"main\",\"content\":\"A\"}"]
        );
        assert_eq!(s.pending(), "{");
    }

    #[test]
    fn empty_records_are_kept() {
        let mut s = LineSplitter::new();
        assert_eq!(s.feed("a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn delimiter_only_feed() {
        let mut s = LineSplitter::new();
        assert!(s.feed("partial").is_empty());
        assert_eq!(s.feed("\n"), vec!["partial"]);
    }

    #[test]
    fn finish_returns_truncated_tail() {
        let mut s = LineSplitter::new();
        let _ = s.feed("done\n{\"type\":\"st");
        assert_eq!(s.finish().as_deref(), Some("{\"type\":\"st"));
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn finish_on_clean_boundary_is_none() {
        let mut s = LineSplitter::new();
        let _ = s.feed("a\n");
        assert_eq!(s.finish(), None);
    }

    #[test]
    fn reset_clears_pending() {
        let mut s = LineSplitter::with_capacity(16);
        let _ = s.feed("leftover");
        s.reset();
        assert_eq!(s.pending(), "");
        assert_eq!(s.feed("x\n"), vec!["x"]);
    }

    proptest! {
        #[test]
        fn feeds_reconstruct_input(text in "[a-z\\n{}\":é]{0,64}", cuts in proptest::collection::vec(0usize..64, 0..8)) {
            let mut points: Vec<usize> = cuts
                .into_iter()
                .map(|c| c.min(text.len()))
                .filter(|&c| text.is_char_boundary(c))
                .collect();
            points.sort_unstable();
            points.dedup();

            let mut s = LineSplitter::new();
            let mut records = Vec::new();
            let mut start = 0;
            for p in points.into_iter().chain(std::iter::once(text.len())) {
                if p < start {
                    continue;
                }
                records.extend(s.feed(&text[start..p]));
                prop_assert!(!s.pending().contains(DELIMITER));
                start = p;
            }

            let mut rebuilt = String::new();
            for r in &records {
                rebuilt.push_str(r);
                rebuilt.push(DELIMITER);
            }
            rebuilt.push_str(s.pending());
            prop_assert_eq!(rebuilt, text);
        }
    }
}
