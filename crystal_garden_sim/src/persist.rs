// Persistence boundary — durable records and the store trait.
//
// The engine never talks to storage directly. It accumulates durable
// records in a `WriteBatch` outbox as it runs; the host drains and flushes
// the batch at whatever cadence suits its I/O budget. During catch-up the
// whole reconstruction is flushed as one batch, bounding write
// amplification for long offline gaps.
//
// Store calls are fire-and-forget from the engine's perspective: the trait
// returns nothing, implementations log failures, and in-memory state stays
// authoritative for the session regardless (write-behind, at-most-once
// durability — acceptable loss on crash). The only synchronous interaction
// is the initial load (`births_by_time` / `checkpoint`) before simulation
// starts.
//
// See also: `catchup.rs` which replays these records, `engine.rs` which
// fills the outbox, the `crystal_garden_store` crate for implementations.

use crate::genome::Genome;
use crate::types::{CellKind, GridCoord, OrganismId};
use serde::{Deserialize, Serialize};

/// Durable record of one organism's germination. For organisms that had
/// already fully dissolved when recorded, `dissolved` is true and replay
/// places only the surviving ash seed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BirthRecord {
    pub organism: OrganismId,
    pub genome: Genome,
    pub x: i32,
    pub z: i32,
    pub timestamp_ms: i64,
    pub dissolved: bool,
}

/// Durable record of one placed cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub organism: OrganismId,
    pub coord: GridCoord,
    pub kind: CellKind,
}

/// The abstract append-only event store the engine persists into.
pub trait GardenStore {
    /// Append one birth record. Fire-and-forget.
    fn append_birth(&mut self, record: &BirthRecord);
    /// Append a batch of cell records. Fire-and-forget.
    fn append_cells(&mut self, batch: &[CellRecord]);
    /// All birth records, ordered by `(timestamp_ms, organism)`.
    fn births_by_time(&self) -> Vec<BirthRecord>;
    /// All persisted cell records, in append order.
    fn all_cells(&self) -> Vec<CellRecord>;
    /// The last simulated-clock checkpoint, if any.
    fn checkpoint(&self) -> Option<i64>;
    /// Record a simulated-clock checkpoint.
    fn set_checkpoint(&mut self, timestamp_ms: i64);
}

/// Pending durable records, drained by the host or the catch-up flush.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    pub births: Vec<BirthRecord>,
    pub cells: Vec<CellRecord>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.births.is_empty() && self.cells.is_empty()
    }

    /// Move another batch's records onto the end of this one.
    pub fn absorb(&mut self, mut other: WriteBatch) {
        self.births.append(&mut other.births);
        self.cells.append(&mut other.cells);
    }

    /// Write everything to the store as one bulk flush: births first (in
    /// order), then the cell batch.
    pub fn flush(self, store: &mut dyn GardenStore) {
        for birth in &self.births {
            store.append_birth(birth);
        }
        if !self.cells.is_empty() {
            store.append_cells(&self.cells);
        }
    }
}
