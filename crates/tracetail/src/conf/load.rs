//! Load — config loading from file and environment variables.

use std::path::Path;

use super::model::{ConfigError, SessionConfig};

impl SessionConfig {
    /// Load configuration. Priority: environment variables > config file >
    /// defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("TRACETAIL_CONFIG_FILE") {
            Ok(path) => {
                tracing::info!("loading configuration from {path}");
                Self::from_file(&path)?
            }
            Err(_) => {
                let default_path = "tracetail.toml";
                if Path::new(default_path).exists() {
                    tracing::info!("loading configuration from {default_path}");
                    Self::from_file(default_path)?
                } else {
                    SessionConfig::default()
                }
            }
        };

        if let Some(capacity) = env_parse("TRACETAIL_BUFFER_CAPACITY") {
            config.buffer_capacity = capacity;
        }
        if let Some(cap) = env_parse("TRACETAIL_FRAME_CAP") {
            config.framer_max_buffer = cap;
        }
        if let Ok(file) = std::env::var("TRACETAIL_SOURCE_FILE") {
            config.source.file = Some(file);
        }
        if let Ok(command) = std::env::var("TRACETAIL_SOURCE_COMMAND") {
            config.source.command = Some(command);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
