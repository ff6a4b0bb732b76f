//! Boot — logging init, config load, engine and source creation.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::SessionConfig;
use crate::engine::IngestionEngine;
use crate::source::LineSource;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracetail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration and build the engine and the line source to attach.
pub fn boot() -> Result<(IngestionEngine, LineSource, SessionConfig), Box<dyn std::error::Error>> {
    info!("Starting tracetail v0.1.0");

    let config = SessionConfig::load()?;
    info!(
        "Loaded configuration: buffer_capacity={}, framer_max_buffer={}",
        config.buffer_capacity, config.framer_max_buffer
    );

    let engine = IngestionEngine::new(config.engine());
    let source = LineSource::from_config(&config.source);
    info!("Reading lines from {}", source.describe());

    Ok((engine, source, config))
}
