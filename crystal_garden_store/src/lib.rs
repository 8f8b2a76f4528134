// crystal_garden_store — persistence collaborators for the garden engine.
//
// The sim crate defines the `GardenStore` trait and never performs I/O
// itself; this crate provides the implementations:
//
// - `MemoryStore`: an in-memory store for tests and headless runs.
// - `JournalStore`: an append-only JSON-lines journal backed by a
//   background writer thread. Appends are fire-and-forget — the engine's
//   tick cadence is never coupled to disk latency — and failures are
//   logged, not propagated: in-memory state stays authoritative for the
//   session (write-behind, at-most-once durability).
//
// Module overview:
// - `memory.rs`:  `MemoryStore`.
// - `journal.rs`: `JournalStore` + the writer thread.

pub mod journal;
pub mod memory;

pub use journal::JournalStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors surfaced when opening a store. Appends never return errors —
/// they are logged by the writer instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("journal io error: {0}")]
    Io(#[from] std::io::Error),
}
