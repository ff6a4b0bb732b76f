//! Tag-style capture grouper.
//!
//! Recognizes `threadtime`-shaped headers (`MM-DD HH:MM:SS.mmm PID TID L Tag:`)
//! and epoch-shaped ones (`1234567.890 PID TID L Tag:`). The capture tool
//! emits one physical line per newline in the original message, each carrying
//! a copy of the header, so grouping keys on the full header tuple. Distinct
//! log statements can share a header at millisecond granularity, which is why
//! appending is gated on continuation heuristics instead of the header alone.

use std::sync::LazyLock;

use regex::Regex;

use crate::frame::OPEN_DELIMITER;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<ts>\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}\.\d+|\d+\.\d{3,6})\s+(?P<pid>\d+)\s+(?P<tid>\d+)\s+(?P<level>[VDIWEFS])\s+(?P<tag>[^:]*?)\s*:\s?(?P<msg>.*)$",
    )
    .expect("logcat header regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderKey {
    timestamp: String,
    pid: String,
    tid: String,
    level: String,
    tag: String,
}

#[derive(Debug)]
struct Entry {
    key: HeaderKey,
    /// Logical line under reconstruction: the first physical line verbatim,
    /// then continuation messages joined by newline.
    buf: String,
}

#[derive(Debug, Default)]
pub struct LogcatGrouper {
    pending: Option<Entry>,
}

impl LogcatGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) -> Vec<String> {
        let (key, msg) = match parse_header(line) {
            Some(parsed) => parsed,
            None => {
                // Foreign line shape: close whatever was open, then let the
                // line through untouched.
                let mut out = self.flush();
                out.push(line.to_string());
                return out;
            }
        };

        if msg.contains(OPEN_DELIMITER) {
            // A structured payload line is authoritative: it either closes a
            // same-header buffer or stands alone. Nothing ever appends to it.
            if let Some(entry) = self.pending.take() {
                if entry.key == key && !entry.buf.contains(OPEN_DELIMITER) {
                    let mut buf = entry.buf;
                    buf.push('\n');
                    buf.push_str(&msg);
                    tracing::trace!(tag = %key.tag, "grouper: payload line closed pending entry");
                    return vec![buf];
                }
                return vec![entry.buf, line.to_string()];
            }
            return vec![line.to_string()];
        }

        if let Some(entry) = self.pending.as_mut() {
            if entry.key == key && is_continuation(&msg, &key.tag) {
                entry.buf.push('\n');
                entry.buf.push_str(&msg);
                return Vec::new();
            }
            // Same or different header, but not a continuation: distinct
            // statement, so the open entry must not absorb it.
            let mut out = self.flush();
            out.extend(self.start_or_emit(line, key, &msg));
            return out;
        }

        self.start_or_emit(line, key, &msg)
    }

    /// Drain the pending entry, if any.
    pub fn flush(&mut self) -> Vec<String> {
        match self.pending.take() {
            Some(entry) => vec![entry.buf],
            None => Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Buffer the line only when its message looks like the first piece of a
    /// multi-line payload; single-line entries are emitted immediately rather
    /// than stalled waiting for a continuation that may never come.
    fn start_or_emit(&mut self, line: &str, key: HeaderKey, msg: &str) -> Vec<String> {
        if starts_multiline(msg, &key.tag) {
            self.pending = Some(Entry {
                key,
                buf: line.to_string(),
            });
            Vec::new()
        } else {
            vec![line.to_string()]
        }
    }
}

fn parse_header(line: &str) -> Option<(HeaderKey, String)> {
    let caps = HEADER.captures(line)?;
    let key = HeaderKey {
        timestamp: caps["ts"].to_string(),
        pid: caps["pid"].to_string(),
        tid: caps["tid"].to_string(),
        level: caps["level"].to_string(),
        tag: caps["tag"].to_string(),
    };
    Some((key, caps["msg"].to_string()))
}

/// The capture tool prefixes each wrapped line of a multi-line message with
/// the tag again, so `Tag: Tag: first line` marks the start of one.
fn starts_multiline(msg: &str, tag: &str) -> bool {
    has_repeated_tag(msg, tag)
}

fn is_continuation(msg: &str, tag: &str) -> bool {
    msg.starts_with(char::is_whitespace)
        || msg.starts_with("at ")
        || msg.starts_with("Caused by:")
        || msg.starts_with("Suppressed:")
        || msg.starts_with("...")
        || has_repeated_tag(msg, tag)
}

fn has_repeated_tag(msg: &str, tag: &str) -> bool {
    if tag.is_empty() {
        return false;
    }
    match msg.strip_prefix(tag) {
        Some(rest) => rest.starts_with(':'),
        None => false,
    }
}
