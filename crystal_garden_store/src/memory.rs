// In-memory store — the reference `GardenStore` implementation.
//
// Used by tests and headless runs that want persistence semantics without
// touching disk. Records live in plain vectors; `births_by_time` sorts by
// `(timestamp, organism id)` so replay order is total and deterministic
// even when several organisms share a timestamp.

use crystal_garden_sim::persist::{BirthRecord, CellRecord, GardenStore};

/// A `GardenStore` held entirely in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    births: Vec<BirthRecord>,
    cells: Vec<CellRecord>,
    checkpoint: Option<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored birth records.
    pub fn birth_count(&self) -> usize {
        self.births.len()
    }
}

impl GardenStore for MemoryStore {
    fn append_birth(&mut self, record: &BirthRecord) {
        self.births.push(*record);
    }

    fn append_cells(&mut self, batch: &[CellRecord]) {
        self.cells.extend_from_slice(batch);
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
    }
}
