//! Configuration — session limits and the line source to attach.

mod load;
mod model;

pub use model::{ConfigError, SessionConfig, SourceConfig};
