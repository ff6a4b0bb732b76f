//! Snapshot filtering.
//!
//! An immutable set of optional predicates over records. Every active
//! predicate must pass (full conjunction); inactive ones are skipped.

use serde::{Deserialize, Serialize};

use crate::record::{Level, ParsedRecord};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub trace_id: Option<String>,
    pub component: Option<String>,
    pub operation: Option<String>,
    pub min_level: Option<Level>,
    /// Case-insensitive substring over message, logger, and span name.
    pub search: Option<String>,
    pub exclude_untraced: bool,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        self.trace_id.is_some()
            || self.component.is_some()
            || self.operation.is_some()
            || self.min_level.is_some()
            || self.search.is_some()
            || self.exclude_untraced
    }

    pub fn matches(&self, record: &ParsedRecord) -> bool {
        if self.exclude_untraced && record.is_untraced() {
            return false;
        }
        if let Some(trace) = &self.trace_id {
            if &record.trace_id != trace {
                return false;
            }
        }
        if let Some(component) = &self.component {
            if record.src_component.as_deref() != Some(component.as_str()) {
                return false;
            }
        }
        if let Some(operation) = &self.operation {
            if record.src_operation.as_deref() != Some(operation.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.min_level {
            if record.level < min {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let hit = [&record.message, &record.logger, &record.span_name]
                .into_iter()
                .flatten()
                .any(|text| text.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}
