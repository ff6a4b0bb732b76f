//! Chunk reassembly for producer-split messages.
//!
//! A producer whose sink enforces a maximum line length splits an oversized
//! message into pieces and tags each physical line with a trailing marker:
//! `(<hex-id>:kmpert...)` for a continuation piece, `(<hex-id>:kmpert!)` for
//! the final piece. This assembler buffers pieces per id and emits the
//! reconstructed message when the final piece arrives. Several ids may be in
//! flight at once; each buffer is independent.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Trailing chunk marker at the end of a (right-trimmed) physical line.
static TRAILING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([0-9a-fA-F]{4,32}):kmpert(\.\.\.|!)\)$").expect("chunk marker regex")
});

/// A chunk marker anywhere in a string, used by the sanitizer to scrub
/// markers that leaked into field values.
pub(crate) static ANY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([0-9a-fA-F]{4,32}:kmpert(?:\.\.\.|!)\)").expect("chunk marker regex")
});

#[derive(Debug, Default)]
pub struct ChunkAssembler {
    buffers: HashMap<String, String>,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one physical line. Unmarked lines pass through unchanged as a
    /// single-element result; marked lines are buffered until their final
    /// piece, which emits the concatenated, right-trimmed message. A final
    /// marker whose id has no buffer is dropped silently.
    pub fn feed(&mut self, line: &str) -> Vec<String> {
        let trimmed = line.trim_end();
        let captures = match TRAILING_MARKER.captures(trimmed) {
            Some(c) => c,
            None => return vec![line.to_string()],
        };

        let marker = captures.get(0).expect("whole match");
        let id = &captures[1];
        let is_final = &captures[2] == "!";
        // Text before the marker keeps its whitespace so pieces join the way
        // the producer wrote them.
        let piece = &trimmed[..marker.start()];

        if is_final {
            match self.buffers.remove(id) {
                Some(mut buffered) => {
                    buffered.push_str(piece);
                    tracing::trace!(id, "chunk: final piece, emitting reassembled line");
                    vec![buffered.trim_end().to_string()]
                }
                None => {
                    tracing::debug!(id, "chunk: orphan final marker, dropping");
                    Vec::new()
                }
            }
        } else {
            self.buffers.entry(id.to_string()).or_default().push_str(piece);
            Vec::new()
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.buffers.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
    }
}
