//! Line parsing — turns one framed candidate into a [`ParsedRecord`].
//!
//! This stage is total: any input, well-formed or not, yields either a record
//! or nothing. Malformed candidates are dropped without signal; the only
//! hard requirements are a locatable `|{ ... }|` payload and the `ts` and
//! `lvl` keys inside it.

pub mod logfmt;
pub mod resolve;
pub mod sanitize;

use std::collections::HashMap;

use crate::frame::{CLOSE_DELIMITER, OPEN_DELIMITER};
use crate::record::{Level, ParsedRecord, RecordKind, UNTRACED_ID};

use resolve::{analyze_prefix, normalize_stack_trace, recover_message};
use sanitize::{sanitize, sanitize_opt};

#[derive(Debug, Default)]
pub struct LineParser;

impl LineParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode one candidate. Locates the payload the same right-to-left way
    /// the framer does, so trailing noise after the close marker (a devtools
    /// source-location suffix, say) is tolerated.
    pub fn parse(&self, candidate: &str) -> Option<ParsedRecord> {
        let open = candidate.rfind(OPEN_DELIMITER)?;
        let close = candidate.rfind(CLOSE_DELIMITER)?;
        if close < open {
            return None;
        }

        let interior = &candidate[open + OPEN_DELIMITER.len()..close];
        let prefix = &candidate[..open];

        let mut fields: HashMap<String, String> = HashMap::new();
        for (key, value) in logfmt::decode_pairs(interior) {
            fields.insert(key, sanitize(&value));
        }

        let timestamp = fields.get("ts")?.clone();
        let level = Level::parse(fields.get("lvl")?)?;

        let kind = match fields.get("kind").map(String::as_str) {
            None => RecordKind::Log,
            Some("SPAN_START") => RecordKind::SpanStart,
            Some("SPAN_END") => RecordKind::SpanEnd,
            Some(_) => return None,
        };

        let trace_id = id_or_default(fields.get("trace"));
        let span_id = id_or_default(fields.get("span"));
        let parent_span_id = fields
            .get("parent")
            .filter(|p| !p.is_empty() && p.as_str() != "0" && p.as_str() != "-")
            .cloned();

        let mut src_component = non_empty(fields.get("src_comp"));
        let mut src_operation = non_empty(fields.get("src_op"));
        let mut src_hint = non_empty(fields.get("src_hint"));
        if let Some(src) = non_empty(fields.get("src")) {
            if src_component.is_none() && src_operation.is_none() {
                match src.split_once('/') {
                    Some((comp, op)) => {
                        src_component = sanitize_opt(comp);
                        src_operation = sanitize_opt(op);
                    }
                    None => src_component = Some(src.clone()),
                }
            }
            if src_hint.is_none() {
                src_hint = Some(src);
            }
        }

        let info = analyze_prefix(prefix);
        let logger = non_empty(fields.get("log"))
            .or_else(|| src_component.clone())
            .or_else(|| src_hint.clone())
            .or_else(|| info.logger.clone());

        let message = match non_empty(fields.get("head")) {
            Some(head) => recover_message(&info.core, logger.as_deref(), &head)
                .map(|m| sanitize(&m))
                .or(Some(head)),
            None => info.message.as_deref().and_then(sanitize_opt),
        };

        if let Some(stack) = fields.get_mut("stack_trace") {
            *stack = normalize_stack_trace(stack);
        }

        Some(ParsedRecord {
            trace_id,
            span_id,
            parent_span_id,
            kind,
            level,
            timestamp,
            span_name: non_empty(fields.get("name")),
            duration_ms: fields.get("dur").and_then(|d| d.parse().ok()),
            logger,
            message,
            src_component,
            src_operation,
            src_hint,
            file: non_empty(fields.get("file")),
            line: fields.get("line").and_then(|l| l.parse().ok()),
            function: non_empty(fields.get("fn")),
            fields,
        })
    }
}

fn id_or_default(value: Option<&String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.clone(),
        _ => UNTRACED_ID.to_string(),
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}
