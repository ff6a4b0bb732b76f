//! Trace tree construction.
//!
//! Records are folded into per-span accumulators held in an arena indexed by
//! span id, with parent/child links stored as indices. A fresh forest is
//! built from the record set on every request; tree shape is a deterministic
//! function of the records, independent of arrival order.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::record::{ParsedRecord, RecordKind, UNTRACED_ID};

#[derive(Debug, Clone, Serialize)]
pub struct SpanNode {
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    /// Only ever taken from a SPAN_START record.
    pub span_kind: Option<String>,
    pub duration_ms: Option<u64>,
    pub start_timestamp: Option<String>,
    pub src_component: Option<String>,
    pub src_operation: Option<String>,
    /// Sorted by key; merged from `a:`/`d:`-prefixed fields, later wins.
    pub attributes: BTreeMap<String, String>,
    /// LOG records plus error-carrying SPAN_END records belonging directly
    /// to this span.
    pub records: Vec<ParsedRecord>,
    pub children: Vec<SpanNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceTree {
    pub trace_id: String,
    pub roots: Vec<SpanNode>,
}

/// Per-span fold state before linking.
struct SpanAccumulator {
    span_id: String,
    first_index: usize,
    parent: Option<String>,
    name: Option<String>,
    span_kind: Option<String>,
    duration_ms: Option<u64>,
    duration_is_final: bool,
    start_ts: Option<String>,
    start_from_span_start: bool,
    src_component: Option<String>,
    src_operation: Option<String>,
    attributes: BTreeMap<String, String>,
    records: Vec<ParsedRecord>,
}

impl SpanAccumulator {
    fn new(span_id: &str, first_index: usize) -> Self {
        Self {
            span_id: span_id.to_string(),
            first_index,
            parent: None,
            name: None,
            span_kind: None,
            duration_ms: None,
            duration_is_final: false,
            start_ts: None,
            start_from_span_start: false,
            src_component: None,
            src_operation: None,
            attributes: BTreeMap::new(),
            records: Vec::new(),
        }
    }

    fn fold(&mut self, record: &ParsedRecord) {
        if self.parent.is_none() {
            self.parent = record.parent_span_id.clone();
        }
        if self.name.is_none() {
            self.name = record.span_name.clone();
        }
        if self.src_component.is_none() {
            self.src_component = record.src_component.clone();
        }
        if self.src_operation.is_none() {
            self.src_operation = record.src_operation.clone();
        }

        match record.kind {
            RecordKind::SpanStart => {
                // A SPAN_START is authoritative for the start timestamp.
                if !self.start_from_span_start {
                    self.start_ts = Some(record.timestamp.clone());
                    self.start_from_span_start = true;
                }
                if self.span_kind.is_none() {
                    self.span_kind = record.fields.get("span_kind").cloned();
                }
                self.merge_attributes(record);
            }
            RecordKind::SpanEnd => {
                if let Some(dur) = record.duration_ms {
                    self.duration_ms = Some(dur);
                    self.duration_is_final = true;
                }
                self.merge_attributes(record);
                if record.stack_trace().is_some() {
                    // Span-ending errors render alongside ordinary logs.
                    self.records.push(record.clone());
                }
            }
            RecordKind::Log => {
                self.records.push(record.clone());
            }
        }

        if !self.start_from_span_start {
            // Best-effort guess until (unless) a SPAN_START shows up.
            match &self.start_ts {
                Some(current) if current.as_str() <= record.timestamp.as_str() => {}
                _ => self.start_ts = Some(record.timestamp.clone()),
            }
        }
        if !self.duration_is_final {
            if let Some(dur) = record.duration_ms {
                self.duration_ms = Some(dur);
            }
        }
    }

    fn merge_attributes(&mut self, record: &ParsedRecord) {
        for (key, value) in &record.fields {
            if let Some(stripped) = key.strip_prefix("a:").or_else(|| key.strip_prefix("d:")) {
                if !stripped.is_empty() {
                    self.attributes.insert(stripped.to_string(), value.clone());
                }
            }
        }
    }
}

/// Ordering for sibling lists: known start first, then start timestamp,
/// then first-seen index, then span id.
fn sibling_order(a: &SpanAccumulator, b: &SpanAccumulator) -> std::cmp::Ordering {
    match (&a.start_ts, &b.start_ts) {
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some(x), Some(y)) => x.cmp(y),
        (None, None) => std::cmp::Ordering::Equal,
    }
    .then_with(|| a.first_index.cmp(&b.first_index))
    .then_with(|| a.span_id.cmp(&b.span_id))
}

/// Build one tree per trace id, excluding untraced records, in first-seen
/// trace order.
pub fn build_forest<'a, I>(records: I) -> Vec<TraceTree>
where
    I: IntoIterator<Item = &'a ParsedRecord>,
{
    let mut trace_order: Vec<String> = Vec::new();
    let mut by_trace: HashMap<String, Vec<&ParsedRecord>> = HashMap::new();

    for record in records {
        if record.is_untraced() {
            continue;
        }
        by_trace
            .entry(record.trace_id.clone())
            .or_insert_with(|| {
                trace_order.push(record.trace_id.clone());
                Vec::new()
            })
            .push(record);
    }

    trace_order
        .into_iter()
        .map(|trace_id| {
            let records = by_trace.remove(&trace_id).unwrap_or_default();
            build_trace(trace_id, &records)
        })
        .collect()
}

fn build_trace(trace_id: String, records: &[&ParsedRecord]) -> TraceTree {
    let mut arena: Vec<SpanAccumulator> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for (position, record) in records.iter().enumerate() {
        let idx = *index_of.entry(record.span_id.clone()).or_insert_with(|| {
            arena.push(SpanAccumulator::new(&record.span_id, position));
            arena.len() - 1
        });
        arena[idx].fold(record);
    }

    // Parent/child links as indices. A span whose parent is itself, unknown,
    // or absent becomes a root.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); arena.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (idx, acc) in arena.iter().enumerate() {
        match acc.parent.as_ref().and_then(|p| index_of.get(p)) {
            Some(&parent_idx) if parent_idx != idx => children[parent_idx].push(idx),
            _ => roots.push(idx),
        }
    }

    for list in children.iter_mut() {
        list.sort_by(|&a, &b| sibling_order(&arena[a], &arena[b]));
    }
    roots.sort_by(|&a, &b| sibling_order(&arena[a], &arena[b]));

    // Parent cycles leave spans unreachable from any root; promote them so
    // no span silently disappears from the snapshot.
    let mut reachable = vec![false; arena.len()];
    for &root in &roots {
        mark_reachable(root, &children, &mut reachable);
    }
    let mut orphans: Vec<usize> = (0..arena.len()).filter(|&i| !reachable[i]).collect();
    orphans.sort_by(|&a, &b| sibling_order(&arena[a], &arena[b]));
    for orphan in orphans {
        if !reachable[orphan] {
            roots.push(orphan);
            mark_reachable(orphan, &children, &mut reachable);
        }
    }

    let mut built = vec![false; arena.len()];
    let root_nodes = roots
        .iter()
        .filter_map(|&idx| build_node(idx, &arena, &children, &mut built))
        .collect();

    TraceTree {
        trace_id,
        roots: root_nodes,
    }
}

fn mark_reachable(idx: usize, children: &[Vec<usize>], reachable: &mut [bool]) {
    if reachable[idx] {
        return;
    }
    reachable[idx] = true;
    for &child in &children[idx] {
        mark_reachable(child, children, reachable);
    }
}

fn build_node(
    idx: usize,
    arena: &[SpanAccumulator],
    children: &[Vec<usize>],
    built: &mut [bool],
) -> Option<SpanNode> {
    if built[idx] {
        return None;
    }
    built[idx] = true;

    let acc = &arena[idx];
    let child_nodes = children[idx]
        .iter()
        .filter_map(|&child| build_node(child, arena, children, built))
        .collect();

    Some(SpanNode {
        span_id: acc.span_id.clone(),
        parent_span_id: acc.parent.clone(),
        name: acc.name.clone().unwrap_or_else(|| acc.span_id.clone()),
        span_kind: acc.span_kind.clone(),
        duration_ms: acc.duration_ms,
        start_timestamp: acc.start_ts.clone(),
        src_component: acc.src_component.clone(),
        src_operation: acc.src_operation.clone(),
        attributes: acc.attributes.clone(),
        records: acc.records.clone(),
        children: child_nodes,
    })
}
