//! Human-prefix analysis.
//!
//! The text before the `|{` delimiter is whatever the capture tool printed:
//! usually its own header (timestamp/pid/tag noise) followed by the
//! producer's human-readable message. These helpers strip the known header
//! shapes, recover an implicit logger/message pair, anchor truncated `head`
//! cursors back into the full text, and normalize stack traces for display.

use std::sync::LazyLock;

use regex::Regex;

/// Tag-style capture header, message spanning the rest of the prefix.
static LOGCAT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^\s*(?:\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}\.\d+|\d+\.\d{3,6})\s+\d+\s+\d+\s+[VDIWEFS]\s+(?P<tag>[^:\n]*?)\s*:\s?(?P<msg>.*)$",
    )
    .expect("logcat header regex")
});

/// Process-style capture header.
static SYSLOG_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)^\s*(?:[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}|\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:\s*[+-]\d{4})?)\s+\S+\[\d+(?::\d+)?\]\s*(?P<msg>.*)$",
    )
    .expect("syslog header regex")
});

/// Bare `logger: message` shape; the logger is a single identifier-like token.
static LOGGER_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<logger>[A-Za-z_$][\w.$-]*):\s+(?P<msg>.*)$").expect("logger regex")
});

/// What the human-readable prefix yields once header noise is stripped.
#[derive(Debug, Default)]
pub struct PrefixInfo {
    /// Implicit logger recovered from a capture-tool tag or a
    /// `logger: message` shape.
    pub logger: Option<String>,
    /// Fallback message when the structured fields carry none.
    pub message: Option<String>,
    /// The header-stripped text, used for `head` anchoring.
    pub core: String,
}

pub fn analyze_prefix(prefix: &str) -> PrefixInfo {
    let trimmed = prefix.trim();
    let mut info = PrefixInfo::default();

    let core = if let Some(caps) = LOGCAT_HEADER.captures(trimmed) {
        info.logger = non_empty(&caps["tag"]);
        caps["msg"].trim().to_string()
    } else if let Some(caps) = SYSLOG_HEADER.captures(trimmed) {
        caps["msg"].trim().to_string()
    } else {
        trimmed.to_string()
    };

    if core.starts_with("+++ ") || core.starts_with("--- ") {
        // Symbolic span boundary markers; the whole core is the message.
        info.message = Some(core.clone());
    } else if let Some(caps) = LOGGER_MESSAGE.captures(&core) {
        if info.logger.is_none() {
            info.logger = non_empty(&caps["logger"]);
        }
        info.message = non_empty(caps["msg"].trim());
    } else {
        info.message = non_empty(&core);
    }

    info.core = core;
    info
}

/// Recover a full message from a possibly-truncated `head` cursor. Returns
/// the core substring starting at the occurrence of `head`, preferring an
/// anchor right after `"<logger>: "` when the logger is known; `None` when
/// `head` does not occur (caller falls back to `head` verbatim).
pub fn recover_message(core: &str, logger: Option<&str>, head: &str) -> Option<String> {
    if head.is_empty() {
        return None;
    }

    if let Some(logger) = logger {
        let anchor = format!("{logger}: ");
        if let Some(at) = core.find(&anchor) {
            let after = at + anchor.len();
            if let Some(pos) = core[after..].find(head) {
                return Some(core[after + pos..].trim_end().to_string());
            }
        }
    }

    core.find(head).map(|pos| core[pos..].trim_end().to_string())
}

/// Normalize a decoded stack trace line by line: strip capture headers that
/// leaked onto continuation lines and re-indent `at `-frames uniformly.
pub fn normalize_stack_trace(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let line = match LOGCAT_HEADER.captures(line) {
                Some(caps) => caps["msg"].to_string(),
                None => match SYSLOG_HEADER.captures(line) {
                    Some(caps) => caps["msg"].to_string(),
                    None => line.to_string(),
                },
            };
            let trimmed = line.trim();
            if trimmed.starts_with("at ") {
                format!("    {trimmed}")
            } else {
                line.trim_end().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Prefix analysis ────────────────────────────────────────

    #[test]
    fn test_bare_logger_message() {
        let info = analyze_prefix("LoggerX: hello world ");
        assert_eq!(info.logger.as_deref(), Some("LoggerX"));
        assert_eq!(info.message.as_deref(), Some("hello world"));
    }

    #[test]
    fn test_logcat_header_stripped() {
        let info = analyze_prefix("01-02 03:04:05.678  1234  5678 I Engine: started up ");
        assert_eq!(info.logger.as_deref(), Some("Engine"));
        assert_eq!(info.message.as_deref(), Some("started up"));
        assert_eq!(info.core, "started up");
    }

    #[test]
    fn test_logcat_header_with_inner_logger() {
        let info = analyze_prefix("01-02 03:04:05.678  1234  5678 I App: Engine: nested ");
        // Tag wins; the inner shape is left to the message.
        assert_eq!(info.logger.as_deref(), Some("App"));
        assert_eq!(info.core, "Engine: nested");
    }

    #[test]
    fn test_syslog_header_stripped() {
        let info = analyze_prefix("Jun 10 12:00:01 MyApp[345] Engine: warmed up ");
        assert_eq!(info.logger.as_deref(), Some("Engine"));
        assert_eq!(info.message.as_deref(), Some("warmed up"));
    }

    #[test]
    fn test_span_markers_are_messages() {
        let open = analyze_prefix("+++ fetch-profile ");
        assert_eq!(open.message.as_deref(), Some("+++ fetch-profile"));
        assert!(open.logger.is_none());

        let close = analyze_prefix("--- fetch-profile ");
        assert_eq!(close.message.as_deref(), Some("--- fetch-profile"));
    }

    #[test]
    fn test_plain_text_is_message() {
        let info = analyze_prefix("  just words here  ");
        assert!(info.logger.is_none());
        assert_eq!(info.message.as_deref(), Some("just words here"));
    }

    #[test]
    fn test_empty_prefix() {
        let info = analyze_prefix("   ");
        assert!(info.logger.is_none());
        assert!(info.message.is_none());
        assert!(info.core.is_empty());
    }

    #[test]
    fn test_url_like_text_not_split_as_logger() {
        // "https" would be a plausible logger token but the separator is
        // ":" + "//", not ": ", so the shape must not match.
        let info = analyze_prefix("https://example.com/x ");
        assert!(info.logger.is_none());
        assert_eq!(info.message.as_deref(), Some("https://example.com/x"));
    }

    // ─── head anchoring ─────────────────────────────────────────

    #[test]
    fn test_head_recovers_truncated_message() {
        let core = "Engine: request finished with status ok in 84ms";
        let msg = recover_message(core, Some("Engine"), "request finished with st");
        assert_eq!(msg.as_deref(), Some("request finished with status ok in 84ms"));
    }

    #[test]
    fn test_head_without_logger_anchor() {
        let core = "request finished with status ok";
        let msg = recover_message(core, None, "request finished");
        assert_eq!(msg.as_deref(), Some("request finished with status ok"));
    }

    #[test]
    fn test_head_not_found() {
        assert!(recover_message("something else entirely", Some("Engine"), "missing").is_none());
    }

    #[test]
    fn test_head_prefers_logger_anchor() {
        // "ok" occurs before the anchor too; the anchored occurrence wins.
        let core = "ok marker Engine: ok done";
        let msg = recover_message(core, Some("Engine"), "ok");
        assert_eq!(msg.as_deref(), Some("ok done"));
    }

    // ─── Stack trace normalization ──────────────────────────────

    #[test]
    fn test_stack_trace_reindents_frames() {
        let raw = "boom happened\nat com.example.Main.run(Main.kt:10)\n\tat com.example.Other.go(Other.kt:5)";
        let normalized = normalize_stack_trace(raw);
        assert_eq!(
            normalized,
            "boom happened\n    at com.example.Main.run(Main.kt:10)\n    at com.example.Other.go(Other.kt:5)"
        );
    }

    #[test]
    fn test_stack_trace_strips_embedded_headers() {
        let raw = "boom\n01-02 03:04:05.678  1234  5678 E App: at com.example.Main.run(Main.kt:10)";
        let normalized = normalize_stack_trace(raw);
        assert_eq!(normalized, "boom\n    at com.example.Main.run(Main.kt:10)");
    }

    #[test]
    fn test_stack_trace_keeps_caused_by() {
        let raw = "top\nCaused by: lower level";
        assert_eq!(normalize_stack_trace(raw), "top\nCaused by: lower level");
    }
}
