//! Ingestion engine — one bounded, stateful session over one logical stream.
//!
//! Owns one instance of every pipeline stage plus the record buffer. Data
//! flows strictly downstream per line: grouper chain → chunk assembler →
//! marker scrub → suffix framer → parser → bounded buffer. Backpressure is
//! bounded eviction, not blocking: the buffer drops its oldest record past
//! capacity and counts the loss.

use std::collections::VecDeque;

use serde::Serialize;

use crate::chunk::ChunkAssembler;
use crate::filter::FilterState;
use crate::frame::{SuffixFramer, DEFAULT_MAX_BUFFER, OPEN_DELIMITER};
use crate::group::{LogcatGrouper, SyslogGrouper};
use crate::parser::sanitize::sanitize;
use crate::parser::LineParser;
use crate::record::ParsedRecord;
use crate::tree::{build_forest, TraceTree};

pub const DEFAULT_BUFFER_CAPACITY: usize = 5000;

/// Per-`ingest` result: lines that carried no structured payload (for
/// optional raw display by a collaborator) and how many records were added.
#[derive(Debug, Default)]
pub struct IngestUpdate {
    pub raw_candidates: Vec<String>,
    pub records_added: usize,
}

/// Point-in-time view over the filtered buffer.
#[derive(Debug, Serialize)]
pub struct AnalysisSnapshot {
    pub traces: Vec<TraceTree>,
    pub untraced: Vec<ParsedRecord>,
    pub dropped: u64,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub buffer_capacity: usize,
    pub framer_max_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            framer_max_buffer: DEFAULT_MAX_BUFFER,
        }
    }
}

pub struct IngestionEngine {
    logcat: LogcatGrouper,
    syslog: SyslogGrouper,
    chunks: ChunkAssembler,
    framer: SuffixFramer,
    parser: LineParser,
    buffer: VecDeque<ParsedRecord>,
    capacity: usize,
    dropped: u64,
    filter: FilterState,
}

impl Default for IngestionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl IngestionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            logcat: LogcatGrouper::new(),
            syslog: SyslogGrouper::new(),
            chunks: ChunkAssembler::new(),
            framer: SuffixFramer::new(config.framer_max_buffer),
            parser: LineParser::new(),
            buffer: VecDeque::with_capacity(config.buffer_capacity.min(1024)),
            capacity: config.buffer_capacity.max(1),
            dropped: 0,
            filter: FilterState::default(),
        }
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Push one raw line through the pipeline.
    pub fn ingest(&mut self, line: &str) -> IngestUpdate {
        let mut update = IngestUpdate::default();

        for grouped in self.group(line) {
            for assembled in self.chunks.feed(&grouped) {
                self.frame_and_parse(&assembled, &mut update);
            }
        }

        if update.records_added > 0 {
            tracing::trace!(added = update.records_added, "ingest: records buffered");
        }
        update
    }

    /// Drain trailing partial state from every stage, in stream order.
    pub fn flush(&mut self) -> IngestUpdate {
        let mut update = IngestUpdate::default();

        let mut tail: Vec<String> = Vec::new();
        tail.extend(self.logcat.flush().into_iter().flat_map(|l| self.syslog.feed(&l)));
        tail.extend(self.syslog.flush());
        for line in tail {
            for assembled in self.chunks.feed(&line) {
                self.frame_and_parse(&assembled, &mut update);
            }
        }

        for candidate in self.framer.flush() {
            self.parse_candidate(&candidate, &mut update);
        }
        update
    }

    /// Apply the filter to the live buffer and build the trace forest from
    /// the survivors. Untraced records are surfaced separately, never inside
    /// a tree.
    pub fn snapshot(&self) -> AnalysisSnapshot {
        let survivors: Vec<&ParsedRecord> = self
            .buffer
            .iter()
            .filter(|r| self.filter.matches(r))
            .collect();

        let untraced = survivors
            .iter()
            .filter(|r| r.is_untraced())
            .map(|r| (*r).clone())
            .collect();
        let traces = build_forest(survivors.iter().copied());

        AnalysisSnapshot {
            traces,
            untraced,
            dropped: self.dropped,
        }
    }

    /// Clear the buffer, the dropped counter, and every stage's state.
    pub fn reset(&mut self) {
        self.logcat.reset();
        self.syslog.reset();
        self.chunks.reset();
        self.framer.reset();
        self.buffer.clear();
        self.dropped = 0;
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn group(&mut self, line: &str) -> Vec<String> {
        self.logcat
            .feed(line)
            .into_iter()
            .flat_map(|l| self.syslog.feed(&l))
            .collect()
    }

    fn frame_and_parse(&mut self, line: &str, update: &mut IngestUpdate) {
        let cleaned = sanitize(line);

        // Lines outside any payload frame are surfaced raw so a collaborator
        // can still display them; they are fed to the framer regardless, in
        // case they belong to a payload opened later on the same entry.
        if !self.framer.is_open() && !cleaned.contains(OPEN_DELIMITER) {
            update.raw_candidates.push(cleaned.clone());
        }

        for candidate in self.framer.feed(&cleaned) {
            self.parse_candidate(&candidate, update);
        }
    }

    fn parse_candidate(&mut self, candidate: &str, update: &mut IngestUpdate) {
        if let Some(record) = self.parser.parse(candidate) {
            self.push(record);
            update.records_added += 1;
        }
    }

    fn push(&mut self, record: ParsedRecord) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
            self.dropped += 1;
        }
        self.buffer.push_back(record);
    }
}
