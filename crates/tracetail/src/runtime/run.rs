//! Run — drive the ingest loop and emit the final analysis.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::conf::SessionConfig;
use crate::engine::IngestionEngine;
use crate::source::LineSource;

/// Pump the line source into the engine until end of stream or Ctrl-C,
/// then flush and write the analysis snapshot as JSON to stdout.
pub async fn run(
    mut engine: IngestionEngine,
    source: LineSource,
    config: SessionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut lines = source
        .spawn(config.source.effective_queue_depth(), stop_rx)
        .await?;

    let mut ingested: u64 = 0;
    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => {
                    engine.ingest(&line);
                    ingested += 1;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                let _ = stop_tx.send(true);
                break;
            }
        }
    }

    // Drain anything the producer already queued before it stopped.
    while let Ok(line) = lines.try_recv() {
        engine.ingest(&line);
        ingested += 1;
    }

    let tail = engine.flush();
    if tail.records_added > 0 {
        info!("Flush recovered {} trailing record(s)", tail.records_added);
    }

    let snapshot = engine.snapshot();
    info!(
        "Ingested {} line(s): {} trace(s), {} untraced record(s)",
        ingested,
        snapshot.traces.len(),
        snapshot.untraced.len()
    );
    if snapshot.dropped > 0 {
        warn!("{} record(s) evicted from the bounded buffer", snapshot.dropped);
    }

    let out = serde_json::to_string_pretty(&snapshot)?;
    println!("{out}");
    Ok(())
}
