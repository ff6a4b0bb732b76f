//! Structured-suffix framing.
//!
//! The structured payload is delimited by `|{` and `}|`. Payload values are
//! free text and may themselves contain delimiter-like substrings (pasted
//! shell output, for one), so framing scans right to left: the true closing
//! marker is the last `}|` that occurs after the last `|{`. Fed lines
//! accumulate newline-joined until such a pair exists, then everything up to
//! and including the close marker is emitted as one candidate.

pub const OPEN_DELIMITER: &str = "|{";
pub const CLOSE_DELIMITER: &str = "}|";

/// Upper bound on an unterminated buffer. A stream that opens a payload and
/// never closes it must not grow memory without bound.
pub const DEFAULT_MAX_BUFFER: usize = 50_000;

#[derive(Debug)]
pub struct SuffixFramer {
    buf: String,
    max_buffer: usize,
}

impl Default for SuffixFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUFFER)
    }
}

impl SuffixFramer {
    pub fn new(max_buffer: usize) -> Self {
        Self {
            buf: String::new(),
            max_buffer,
        }
    }

    /// True while the buffer holds an open delimiter with no close after it,
    /// meaning a payload is mid-frame.
    pub fn is_open(&self) -> bool {
        match self.buf.rfind(OPEN_DELIMITER) {
            Some(open) => match self.buf.rfind(CLOSE_DELIMITER) {
                Some(close) => close < open,
                None => true,
            },
            None => false,
        }
    }

    /// Append one logical line and emit every candidate that completed.
    pub fn feed(&mut self, line: &str) -> Vec<String> {
        if !self.buf.is_empty() {
            self.buf.push('\n');
        }
        self.buf.push_str(line);

        let mut out = Vec::new();
        loop {
            let open = match self.buf.rfind(OPEN_DELIMITER) {
                Some(i) => i,
                None => break,
            };
            let close = match self.buf.rfind(CLOSE_DELIMITER) {
                Some(i) => i,
                None => break,
            };
            if close < open {
                break;
            }

            let end = close + CLOSE_DELIMITER.len();
            out.push(self.buf[..end].to_string());
            let rest = self.buf[end..].trim_start_matches('\n').to_string();
            self.buf = rest;
        }

        if out.is_empty() && self.buf.len() > self.max_buffer {
            tracing::warn!(
                len = self.buf.len(),
                cap = self.max_buffer,
                "framer: unterminated buffer exceeded cap, discarding"
            );
            self.buf.clear();
        }

        out
    }

    /// Best effort at stream end: emit whatever remains, complete or not.
    pub fn flush(&mut self) -> Vec<String> {
        if self.buf.is_empty() {
            return Vec::new();
        }
        vec![std::mem::take(&mut self.buf)]
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }
}
