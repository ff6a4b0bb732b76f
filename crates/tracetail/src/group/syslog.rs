//! Process-style capture grouper.
//!
//! Recognizes device-syslog headers, either `MMM d HH:MM:SS process[pid]` or
//! `YYYY-MM-DD HH:MM:SS(.ffffff)(+ZZZZ) process[pid:tid]`. This capture tool
//! prints the header once per logical message, so the policy is simple: a
//! header line starts a fresh entry and every following line belongs to it
//! until the next header or end of stream.

use std::sync::LazyLock;

use regex::Regex;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}|\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:\s*[+-]\d{4})?)\s+\S+\[\d+(?::\d+)?\]",
    )
    .expect("syslog header regex")
});

#[derive(Debug, Default)]
pub struct SyslogGrouper {
    pending: Option<String>,
}

impl SyslogGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) -> Vec<String> {
        if HEADER.is_match(line) {
            let out = self.flush();
            self.pending = Some(line.to_string());
            return out;
        }

        match self.pending.as_mut() {
            Some(buf) => {
                buf.push('\n');
                buf.push_str(line);
                Vec::new()
            }
            // No header seen yet: not this capture tool's stream shape.
            None => vec![line.to_string()],
        }
    }

    pub fn flush(&mut self) -> Vec<String> {
        match self.pending.take() {
            Some(buf) => vec![buf],
            None => Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Pass-through ───────────────────────────────────────────

    #[test]
    fn test_no_header_ever_passes_through() {
        let mut g = SyslogGrouper::new();
        assert_eq!(g.feed("plain line"), vec!["plain line".to_string()]);
        assert_eq!(g.feed("another"), vec!["another".to_string()]);
        assert!(g.flush().is_empty());
    }

    // ─── Grouping ───────────────────────────────────────────────

    #[test]
    fn test_header_starts_entry_and_next_header_closes() {
        let mut g = SyslogGrouper::new();
        assert!(g
            .feed("Jun 10 12:00:01 MyApp[345] first message")
            .is_empty());
        assert!(g.feed("wrapped tail of first").is_empty());

        let out = g.feed("Jun 10 12:00:02 MyApp[345] second message");
        assert_eq!(
            out,
            vec!["Jun 10 12:00:01 MyApp[345] first message\nwrapped tail of first".to_string()]
        );

        let rest = g.flush();
        assert_eq!(rest, vec!["Jun 10 12:00:02 MyApp[345] second message".to_string()]);
    }

    #[test]
    fn test_iso_header_with_tid() {
        let mut g = SyslogGrouper::new();
        assert!(g
            .feed("2025-01-01 10:00:00.123456 +0200 MyApp[42:99] hello |{ ts=1 lvl=info }|")
            .is_empty());
        let out = g.flush();
        assert_eq!(out.len(), 1);
        assert!(out[0].ends_with("}|"));
    }

    #[test]
    fn test_interleaved_noise_appends_to_open_entry() {
        let mut g = SyslogGrouper::new();
        g.feed("Jun 10 12:00:01 MyApp[345] head");
        g.feed("  continuation one");
        g.feed("  continuation two");
        let out = g.flush();
        assert_eq!(
            out,
            vec!["Jun 10 12:00:01 MyApp[345] head\n  continuation one\n  continuation two".to_string()]
        );
    }

    #[test]
    fn test_reset_discards_pending() {
        let mut g = SyslogGrouper::new();
        g.feed("Jun 10 12:00:01 MyApp[345] head");
        g.reset();
        assert!(g.flush().is_empty());
        // Pass-through resumes until the next header.
        assert_eq!(g.feed("stray"), vec!["stray".to_string()]);
    }
}
