//! Runtime module — session lifecycle: boot, run, shutdown.

pub mod boot;
pub mod run;
