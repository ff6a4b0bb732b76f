//! Line sources.
//!
//! The pipeline is synchronous and single-owner; the host runs the line
//! source on a producer task feeding a bounded channel, and a consumer
//! drains it calling the engine. Shutdown is cooperative: a watch flag
//! checked between line reads, so a line is delivered whole or not at all.

use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, watch};

use crate::conf::SourceConfig;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn command {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command {0:?} has no stdout handle")]
    NoStdout(String),
}

#[derive(Debug, Clone)]
pub enum LineSource {
    Stdin,
    File(String),
    Command(String),
}

impl LineSource {
    pub fn from_config(config: &SourceConfig) -> Self {
        if let Some(path) = &config.file {
            LineSource::File(path.clone())
        } else if let Some(command) = &config.command {
            LineSource::Command(command.clone())
        } else {
            LineSource::Stdin
        }
    }

    pub fn describe(&self) -> String {
        match self {
            LineSource::Stdin => "stdin".to_string(),
            LineSource::File(path) => format!("file {path}"),
            LineSource::Command(command) => format!("command {command:?}"),
        }
    }

    /// Spawn the producer task. Lines arrive on the returned receiver until
    /// end of stream, a read error, or shutdown; the channel closing is the
    /// end-of-stream signal.
    pub async fn spawn(
        self,
        queue_depth: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Result<mpsc::Receiver<String>, SourceError> {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));

        match self {
            LineSource::Stdin => {
                let reader = BufReader::new(tokio::io::stdin());
                tokio::spawn(pump_lines(reader, tx, shutdown));
            }
            LineSource::File(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|source| SourceError::Open {
                        path: path.clone(),
                        source,
                    })?;
                tokio::spawn(pump_lines(BufReader::new(file), tx, shutdown));
            }
            LineSource::Command(command) => {
                let mut child = tokio::process::Command::new("sh")
                    .arg("-c")
                    .arg(&command)
                    .stdout(Stdio::piped())
                    .stderr(Stdio::null())
                    .spawn()
                    .map_err(|source| SourceError::Spawn {
                        command: command.clone(),
                        source,
                    })?;
                let stdout = child
                    .stdout
                    .take()
                    .ok_or_else(|| SourceError::NoStdout(command.clone()))?;
                tokio::spawn(async move {
                    pump_lines(BufReader::new(stdout), tx, shutdown).await;
                    // Reap the child once its stdout is done.
                    let _ = child.wait().await;
                });
            }
        }

        Ok(rx)
    }
}

async fn pump_lines<R>(reader: BufReader<R>, tx: mpsc::Sender<String>, shutdown: watch::Receiver<bool>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        if *shutdown.borrow() {
            tracing::debug!("source: shutdown requested, stopping reader");
            break;
        }
        match lines.next_line().await {
            Ok(Some(line)) => {
                // Send blocks when the consumer lags; that is the bounded
                // hand-off doing its job.
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "source: read failed, ending stream");
                break;
            }
        }
    }
}
