//! Replay application.
//!
//! Events are reconciled strictly one at a time in canonical chain order
//! (block number, then log index). The market idempotence guard relies on
//! that order, so an event positioned before its predecessor aborts the
//! replay. An exact repeat of the previous position is allowed; the
//! reconcilers treat redelivery as a no-op.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use fuse_chain::RecordedChain;
use fuse_core::EventRecord;
use fuse_reconcile::{EventHandler, HandleOutcome};
use fuse_store::{InMemoryStore, SnapshotWriter};
use fuse_telemetry::Metrics;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Counts from one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub processed: usize,
    pub skipped: usize,
    pub last_block: Option<u64>,
}

pub struct Indexer {
    config: AppConfig,
    chain: RecordedChain,
    store: InMemoryStore,
    last_position: Option<(u64, u64)>,
}

impl Indexer {
    /// Load the recorded chain state named in `config`.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        info!(path = %config.chain_state.display(), "Loading recorded chain state");
        let chain = RecordedChain::from_file(&config.chain_state)?;
        info!(calls = chain.len(), "Chain state loaded");
        Ok(Self::with_chain(config, chain))
    }

    pub fn with_chain(config: AppConfig, chain: RecordedChain) -> Self {
        Self {
            config,
            chain,
            store: InMemoryStore::new(),
            last_position: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// Replay the configured event log and write the snapshot.
    pub fn run(&mut self) -> AppResult<(ReplaySummary, PathBuf)> {
        let events = read_event_log(&self.config.event_log)?;
        info!(events = events.len(), "Replaying event log");
        let summary = self.replay(events)?;
        let snapshot = self.write_snapshot()?;
        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            entities = self.store.len(),
            snapshot = %snapshot.display(),
            "Replay complete"
        );
        Ok((summary, snapshot))
    }

    /// Reconcile `events` in order. Stops at the first out-of-order event;
    /// everything before it stays applied.
    pub fn replay(
        &mut self,
        events: impl IntoIterator<Item = EventRecord>,
    ) -> AppResult<ReplaySummary> {
        let handler = EventHandler::new(&self.chain, &self.config.protocol)?;
        let mut summary = ReplaySummary::default();

        for record in events {
            let position = record.meta.position();
            if let Some(prev) = self.last_position {
                if position < prev {
                    return Err(AppError::OutOfOrder {
                        block: position.0,
                        log_index: position.1,
                        prev_block: prev.0,
                        prev_log_index: prev.1,
                    });
                }
            }
            self.last_position = Some(position);

            debug!(
                event = record.event.name(),
                block = position.0,
                log_index = position.1,
                "Handling event"
            );
            match handler.handle(&mut self.store, &record) {
                HandleOutcome::Applied => summary.processed += 1,
                HandleOutcome::Skipped(_) => summary.skipped += 1,
            }
            summary.last_block = Some(position.0);
        }

        Ok(summary)
    }

    /// Dump every stored entity to `<output_dir>/entities_<label>.jsonl`.
    pub fn write_snapshot(&self) -> AppResult<PathBuf> {
        let mut writer = match &self.config.snapshot_label {
            Some(label) => SnapshotWriter::new(&self.config.output_dir, label, self.config.snapshot_buffer),
            None => SnapshotWriter::dated(&self.config.output_dir, self.config.snapshot_buffer),
        };
        writer.write_all(self.store.iter())?;
        writer.close()?;
        Ok(writer.path().to_path_buf())
    }
}

/// Prometheus text dump of every counter recorded so far.
pub fn metrics_report() -> AppResult<String> {
    Ok(Metrics::render()?)
}

/// Parse a JSON Lines event log. Blank lines are skipped.
pub fn read_event_log(path: impl AsRef<Path>) -> AppResult<Vec<EventRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| AppError::EventLog {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        events.push(record);
    }
    Ok(events)
}
