//! Record model — the decoded form of one structured log/span line.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Trace id used for records that were emitted outside any trace.
pub const UNTRACED_ID: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    SpanStart,
    SpanEnd,
    Log,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::SpanStart => "span_start",
            RecordKind::SpanEnd => "span_end",
            RecordKind::Log => "log",
        }
    }
}

/// Severity levels in ascending order, so `Ord` doubles as a
/// minimum-level comparison for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    Assert,
}

impl Level {
    /// Parse a `lvl` field value (case-insensitive). Anything outside the
    /// known set is rejected, which invalidates the whole candidate.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "verbose" => Some(Level::Verbose),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "assert" => Some(Level::Assert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Verbose => "verbose",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Assert => "assert",
        }
    }
}

/// One fully decoded structured record. Immutable once constructed; the
/// parser produces exactly one per valid framed candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedRecord {
    /// `"0"` means untraced; such records never enter a trace tree.
    pub trace_id: String,
    /// `"0"` when the producer did not assign one.
    pub span_id: String,
    /// Normalized: `None` when the raw value was absent, `"0"` or `"-"`.
    pub parent_span_id: Option<String>,
    pub kind: RecordKind,
    pub level: Level,
    /// Opaque at this layer; format varies by capture tool.
    pub timestamp: String,
    pub span_name: Option<String>,
    /// Meaningful on SPAN_END records.
    pub duration_ms: Option<u64>,
    pub logger: Option<String>,
    pub message: Option<String>,
    pub src_component: Option<String>,
    pub src_operation: Option<String>,
    pub src_hint: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub function: Option<String>,
    /// Every decoded key/value pair, values sanitized. Insertion order is
    /// irrelevant; keys are unique.
    pub fields: HashMap<String, String>,
}

impl ParsedRecord {
    pub fn is_untraced(&self) -> bool {
        self.trace_id == UNTRACED_ID
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.fields.get("stack_trace").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_case_insensitive() {
        assert_eq!(Level::parse("INFO"), Some(Level::Info));
        assert_eq!(Level::parse("Warn"), Some(Level::Warn));
        assert_eq!(Level::parse("assert"), Some(Level::Assert));
        assert_eq!(Level::parse("verbose"), Some(Level::Verbose));
    }

    #[test]
    fn test_level_parse_rejects_unknown() {
        assert_eq!(Level::parse("notice"), None);
        assert_eq!(Level::parse(""), None);
        assert_eq!(Level::parse("warning"), None);
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Verbose < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Assert);
    }
}
