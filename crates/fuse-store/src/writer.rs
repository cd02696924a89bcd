//! JSON Lines snapshot writer for stored entities.
//!
//! Each line is one `StoredEntity`, tagged with its kind:
//! - Files are opened in append mode, never truncated
//! - A torn write only affects the last line
//! - `read_snapshot` loads a file back into records

use crate::error::{StoreError, StoreResult};
use chrono::Utc;
use fuse_core::StoredEntity;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

struct ActiveWriter {
    writer: BufWriter<File>,
    records_written: usize,
}

/// Buffered JSON Lines writer for entity snapshots.
///
/// Output goes to `<base_dir>/entities_<label>.jsonl`.
pub struct SnapshotWriter {
    path: PathBuf,
    buffer: Vec<StoredEntity>,
    max_buffer_size: usize,
    active_writer: Option<ActiveWriter>,
}

impl SnapshotWriter {
    pub fn new(base_dir: impl AsRef<Path>, label: &str, max_buffer_size: usize) -> Self {
        let base_dir = base_dir.as_ref();
        if let Err(e) = std::fs::create_dir_all(base_dir) {
            warn!(?e, dir = %base_dir.display(), "Failed to create snapshot directory");
        }

        Self {
            path: base_dir.join(format!("entities_{label}.jsonl")),
            buffer: Vec::with_capacity(max_buffer_size),
            max_buffer_size: max_buffer_size.max(1),
            active_writer: None,
        }
    }

    /// Writer labelled with today's UTC date.
    pub fn dated(base_dir: impl AsRef<Path>, max_buffer_size: usize) -> Self {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        Self::new(base_dir, &today, max_buffer_size)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add(&mut self, entity: StoredEntity) -> StoreResult<()> {
        self.buffer.push(entity);

        if self.buffer.len() >= self.max_buffer_size {
            self.flush()?;
        }

        Ok(())
    }

    /// Buffer every entity from `entities`, flushing as the buffer fills.
    pub fn write_all<'a>(
        &mut self,
        entities: impl IntoIterator<Item = &'a StoredEntity>,
    ) -> StoreResult<usize> {
        let mut count = 0;
        for entity in entities {
            self.add(entity.clone())?;
            count += 1;
        }
        Ok(count)
    }

    fn open(&mut self) -> StoreResult<&mut ActiveWriter> {
        if self.active_writer.is_none() {
            info!(path = %self.path.display(), "Opening snapshot writer (append mode)");
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.active_writer = Some(ActiveWriter {
                writer: BufWriter::new(file),
                records_written: 0,
            });
        }
        self.active_writer
            .as_mut()
            .ok_or_else(|| StoreError::Io(std::io::Error::other("snapshot writer not open")))
    }

    pub fn flush(&mut self) -> StoreResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let records = std::mem::take(&mut self.buffer);
        let active = self.open()?;
        for record in &records {
            let json = serde_json::to_string(record)?;
            writeln!(active.writer, "{json}")?;
        }
        active.writer.flush()?;
        active.records_written += records.len();

        debug!(records = records.len(), "Flushed entities to snapshot");
        Ok(())
    }

    fn close_active_writer(&mut self) {
        if let Some(mut active) = self.active_writer.take() {
            if let Err(e) = active.writer.flush() {
                warn!(?e, "Failed to flush snapshot writer on close");
            }
            info!(
                path = %self.path.display(),
                records = active.records_written,
                "Closed snapshot writer"
            );
        }
    }

    /// Flush pending records and release the file.
    pub fn close(&mut self) -> StoreResult<()> {
        self.flush()?;
        self.close_active_writer();
        Ok(())
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(?e, "Failed to flush snapshot buffer on drop");
        }
        self.close_active_writer();
    }
}

/// Read a snapshot file back. Blank lines are skipped.
pub fn read_snapshot(path: impl AsRef<Path>) -> StoreResult<Vec<StoredEntity>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entities = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entity = serde_json::from_str(&line).map_err(|e| StoreError::Snapshot {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        entities.push(entity);
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EntityStore, InMemoryStore};
    use fuse_core::{Account, Entity, Market, Pool};
    use tempfile::TempDir;

    fn account(id: usize) -> StoredEntity {
        Account::blank(&format!("0x{id:040x}")).into_stored()
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = SnapshotWriter::new(temp_dir.path(), "test", 100);

        for i in 0..5 {
            writer.add(account(i)).unwrap();
        }
        writer.close().unwrap();

        let entities = read_snapshot(writer.path()).unwrap();
        assert_eq!(entities.len(), 5);
        assert_eq!(entities[0], account(0));
        assert!(writer.path().ends_with("entities_test.jsonl"));
    }

    #[test]
    fn test_append_mode() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut writer = SnapshotWriter::new(temp_dir.path(), "run", 100);
            for i in 0..3 {
                writer.add(account(i)).unwrap();
            }
            writer.close().unwrap();
        }
        {
            let mut writer = SnapshotWriter::new(temp_dir.path(), "run", 100);
            for i in 3..6 {
                writer.add(account(i)).unwrap();
            }
        }

        let entities = read_snapshot(temp_dir.path().join("entities_run.jsonl")).unwrap();
        assert_eq!(entities.len(), 6, "second writer appends, flushed on drop");
    }

    #[test]
    fn test_buffer_flushes_when_full() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = SnapshotWriter::new(temp_dir.path(), "small", 2);

        writer.add(account(0)).unwrap();
        assert!(!writer.path().exists());
        writer.add(account(1)).unwrap();
        assert_eq!(read_snapshot(writer.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_flush_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = SnapshotWriter::new(temp_dir.path(), "empty", 100);
        writer.flush().unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = InMemoryStore::new();
        let mut pool = Pool::blank("0xpool");
        pool.add_market("0xmarket");
        store.save(pool);
        store.save(Market::blank("0xmarket"));

        let mut writer = SnapshotWriter::new(temp_dir.path(), "full", 10);
        assert_eq!(writer.write_all(store.iter()).unwrap(), 2);
        writer.close().unwrap();

        let restored: InMemoryStore = read_snapshot(writer.path()).unwrap().into_iter().collect();
        assert_eq!(restored, store);
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"entity\":\"account\",\"id\":\"0x1\",\"count_liquidated\":0,\"count_liquidator\":0,\"has_borrowed\":false}\nnot json\n").unwrap();

        assert!(matches!(
            read_snapshot(&path),
            Err(StoreError::Snapshot { line: 2, .. })
        ));
    }
}
