//! Capture-tool multiline grouping.
//!
//! Mobile/OS capture tools split one logical log line into several physical
//! lines. The two grouper variants here coalesce those back into logical
//! lines for the two header shapes seen in practice:
//!
//! - [`logcat::LogcatGrouper`] — tag-style headers
//!   (`timestamp pid tid level tag: message`), conservative continuation
//!   heuristics so unrelated statements sharing a header never merge.
//! - [`syslog::SyslogGrouper`] — process-style headers
//!   (`timestamp process[pid:tid] message`), where every header line starts a
//!   fresh entry and everything until the next header belongs to it.
//!
//! Both are pure reducers over one pending entry: `feed` returns whatever
//! became complete, `flush` drains the tail at end of stream.

pub mod logcat;
pub mod syslog;

pub use logcat::LogcatGrouper;
pub use syslog::SyslogGrouper;
