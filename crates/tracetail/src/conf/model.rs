//! Model — SessionConfig and related structs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineConfig, DEFAULT_BUFFER_CAPACITY};
use crate::frame::DEFAULT_MAX_BUFFER;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Bounded record buffer capacity; oldest records are evicted past it.
    pub buffer_capacity: usize,
    /// Cap on the framer's unterminated accumulation buffer, in bytes.
    pub framer_max_buffer: usize,
    pub source: SourceConfig,
}

/// Where lines come from. Exactly one of `file` / `command` may be set;
/// neither means standard input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub file: Option<String>,
    pub command: Option<String>,
    /// Producer → consumer hand-off queue depth.
    pub queue_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            framer_max_buffer: DEFAULT_MAX_BUFFER,
            source: SourceConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Invalid(
                "buffer_capacity must be > 0".to_string(),
            ));
        }
        if self.framer_max_buffer == 0 {
            return Err(ConfigError::Invalid(
                "framer_max_buffer must be > 0".to_string(),
            ));
        }
        if self.source.file.is_some() && self.source.command.is_some() {
            return Err(ConfigError::Invalid(
                "source.file and source.command are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            buffer_capacity: self.buffer_capacity,
            framer_max_buffer: self.framer_max_buffer,
        }
    }
}

impl SourceConfig {
    pub fn effective_queue_depth(&self) -> usize {
        if self.queue_depth == 0 {
            1024
        } else {
            self.queue_depth
        }
    }
}
