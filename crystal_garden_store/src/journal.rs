// Append-only JSON-lines journal with a background writer thread.
//
// Each record is one JSON line: a tagged `JournalLine` wrapping a birth,
// a cell batch, or a checkpoint. Appends go over an mpsc channel to a
// dedicated writer thread, so the simulation loop never blocks on disk.
// The in-memory view updated alongside each append is what the synchronous
// load queries read — the file is only re-parsed on `open()`.
//
// Failure policy: write and encode failures are logged (`tracing::warn!`)
// and dropped; the engine's in-memory state remains authoritative for the
// session, and the next catch-up re-derives from whatever actually reached
// the file. A torn final line from a crashed writer is skipped with a
// warning on the next open.
//
// See also: `memory.rs` for the I/O-free implementation, the
// `crystal_garden_sim::catchup` module for the replay that consumes this.

use crate::StoreError;
use crystal_garden_sim::persist::{BirthRecord, CellRecord, GardenStore};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// One journal file line.
#[derive(Debug, Serialize, Deserialize)]
enum JournalLine {
    Birth(BirthRecord),
    Cells(Vec<CellRecord>),
    Checkpoint(i64),
}

/// Append-only journal store. Cheap to append, synchronous only at open.
pub struct JournalStore {
    path: PathBuf,
    births: Vec<BirthRecord>,
    cells: Vec<CellRecord>,
    checkpoint: Option<i64>,
    tx: Option<mpsc::Sender<JournalLine>>,
    worker: Option<JoinHandle<()>>,
}

impl JournalStore {
    /// Open (or create) a journal file, loading the existing history into
    /// memory and starting the writer thread.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let mut births = Vec::new();
        let mut cells = Vec::new();
        let mut checkpoint = None;
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (number, line) in reader.lines().enumerate() {
                let line = line?;
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<JournalLine>(&line) {
                    Ok(JournalLine::Birth(record)) => births.push(record),
                    Ok(JournalLine::Cells(batch)) => cells.extend(batch),
                    Ok(JournalLine::Checkpoint(ts)) => checkpoint = Some(ts),
                    Err(err) => {
                        // Usually a torn line from a crashed writer.
                        tracing::warn!(line = number + 1, %err, "skipping unreadable journal line");
                    }
                }
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let (tx, rx) = mpsc::channel::<JournalLine>();
        let worker = thread::spawn(move || {
            let mut writer = BufWriter::new(file);
            while let Ok(line) = rx.recv() {
                match serde_json::to_string(&line) {
                    Ok(json) => {
                        if let Err(err) = writeln!(writer, "{json}") {
                            tracing::warn!(%err, "journal append failed; record dropped");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, "journal encode failed; record dropped");
                    }
                }
                if let Err(err) = writer.flush() {
                    tracing::warn!(%err, "journal flush failed");
                }
            }
        });

        Ok(Self {
            path,
            births,
            cells,
            checkpoint,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fire-and-forget append to the writer thread.
    fn send(&self, line: JournalLine) {
        if let Some(tx) = &self.tx {
            if tx.send(line).is_err() {
                tracing::warn!("journal writer is gone; record dropped");
            }
        }
    }

    /// Drain the writer queue and stop the thread. Also runs on drop; this
    /// explicit form exists for hosts that want a clean shutdown point.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender ends the writer's recv loop after it drains
        // everything already queued.
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("journal writer thread panicked");
            }
        }
    }
}

impl Drop for JournalStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl GardenStore for JournalStore {
    fn append_birth(&mut self, record: &BirthRecord) {
        self.births.push(*record);
        self.send(JournalLine::Birth(*record));
    }

    fn append_cells(&mut self, batch: &[CellRecord]) {
        self.cells.extend_from_slice(batch);
        self.send(JournalLine::Cells(batch.to_vec()));
    }

    fn births_by_time(&self) -> Vec<BirthRecord> {
        let mut records = self.births.clone();
        records.sort_by_key(|r| (r.timestamp_ms, r.organism));
        records
    }

    fn all_cells(&self) -> Vec<CellRecord> {
        self.cells.clone()
    }

    fn checkpoint(&self) -> Option<i64> {
        self.checkpoint
    }

    fn set_checkpoint(&mut self, timestamp_ms: i64) {
        self.checkpoint = Some(timestamp_ms);
        self.send(JournalLine::Checkpoint(timestamp_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_garden_sim::genome::Genome;
    use crystal_garden_sim::types::{CellKind, GridCoord, OrganismId};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "crystal_garden_journal_{tag}_{}_{nanos}.jsonl",
            std::process::id()
        ))
    }

    fn birth(id: u64, ts: i64) -> BirthRecord {
        BirthRecord {
            organism: OrganismId(id),
            genome: Genome::from_hex("ffffff000000"),
            x: 5,
            z: 6,
            timestamp_ms: ts,
            dissolved: false,
        }
    }

    #[test]
    fn journal_survives_reopen() {
        let path = scratch_path("reopen");
        {
            let mut store = JournalStore::open(&path).expect("open");
            store.append_birth(&birth(1, 100));
            store.append_birth(&birth(2, 50));
            store.append_cells(&[CellRecord {
                organism: OrganismId(1),
                coord: GridCoord::new(5, 0, 6),
                kind: CellKind::Stem,
            }]);
            store.set_checkpoint(12_345);
            store.close();
        }

        let store = JournalStore::open(&path).expect("reopen");
        let ordered = store.births_by_time();
        assert_eq!(ordered.len(), 2);
        // Time order, not append order.
        assert_eq!(ordered[0].organism, OrganismId(2));
        assert_eq!(ordered[1].organism, OrganismId(1));
        assert_eq!(store.all_cells().len(), 1);
        assert_eq!(store.checkpoint(), Some(12_345));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn torn_trailing_line_is_skipped() {
        let path = scratch_path("torn");
        {
            let mut store = JournalStore::open(&path).expect("open");
            store.append_birth(&birth(1, 100));
            store.close();
        }
        // Simulate a crash mid-write: append half a record.
        {
            use std::io::Write as _;
            let mut file = OpenOptions::new().append(true).open(&path).expect("append");
            write!(file, "{{\"Birth\":{{\"organism\"").expect("write");
        }

        let store = JournalStore::open(&path).expect("reopen");
        assert_eq!(store.births_by_time().len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_opens_empty() {
        let path = scratch_path("fresh");
        let store = JournalStore::open(&path).expect("open");
        assert!(store.births_by_time().is_empty());
        assert!(store.all_cells().is_empty());
        assert_eq!(store.checkpoint(), None);
        drop(store);
        let _ = std::fs::remove_file(&path);
    }
}
