// Catch-up — reconstructing live state from the persisted history.
//
// Given the store's time-ordered birth records (plus, for long-dead
// organisms, terminal ash records) and an optional clock checkpoint, the
// controller rebuilds a garden that is statistically equivalent to the one
// the engine would have grown had it never stopped:
//
// 1. Spontaneous seeding is disabled — persisted births must not be
//    double-counted by fresh random seeds landing in the same span.
// 2. The clock seeds from the checkpoint (or the earliest record).
// 3. Records replay in timestamp order; the gap between consecutive
//    records converts to ticks at the fixed clock ratio and runs through
//    the same `Engine::step` path as live ticking — one code path for
//    both modes.
// 4. After the last record, seeding is restored and the remaining gap to
//    "now" is advanced; organisms born here are genuinely new.
// 5. Everything generated during catch-up flushes to the store as one
//    batch, bounding write amplification for long offline gaps.
//
// Replay is *statistically* deterministic, not bit-identical: tropism,
// branching, and seeding draw randomness, so a replayed garden has the
// same population (organism count, genomes, birth coordinates, lifecycle
// timing ratios) while individual plant shapes differ between runs. This
// is accepted behavior, not a bug — two engines with the same seed do
// reproduce each other exactly.
//
// See also: `persist.rs` for the records and store trait, `engine.rs` for
// `restore()` and the tick loop, `clock.rs` for the ms→tick ratio.

use crate::engine::Engine;
use crate::event::GardenEvent;
use crate::persist::GardenStore;

/// What a catch-up run did, for logging and tests.
#[derive(Clone, Copy, Debug)]
pub struct CatchUpSummary {
    /// Persisted birth records replayed into the engine.
    pub replayed_records: usize,
    /// Total ticks advanced to reach "now".
    pub ticks_advanced: u64,
    /// Organisms registered during catch-up (replayed + newly seeded).
    pub born_during_catchup: u64,
}

/// Reconstruct engine state from the store, advance to `now_ms`, and flush
/// the reconstruction back as a single batch. Call on a freshly created
/// engine before live ticking starts.
pub fn catch_up(engine: &mut Engine, store: &mut dyn GardenStore, now_ms: i64) -> CatchUpSummary {
    let records = store.births_by_time();
    let checkpoint = store.checkpoint();

    let start_ms = checkpoint
        .or_else(|| records.first().map(|r| r.timestamp_ms))
        .unwrap_or(now_ms);
    engine.clock.set_timestamp(start_ms);

    let was_seeding = engine.seeding_enabled;
    engine.seeding_enabled = false;

    let born_before = engine.total_born();
    let mut ticks_advanced = 0u64;
    let mut scratch: Vec<GardenEvent> = Vec::new();
    let mut current_ms = start_ms;

    for record in &records {
        let gap = (record.timestamp_ms - current_ms).max(0) as f64;
        let ticks = engine.clock.ticks_for_elapsed(gap);
        engine.advance(ticks);
        ticks_advanced += ticks;

        engine.restore(record, &mut scratch);
        current_ms = current_ms.max(record.timestamp_ms);
    }

    // The span past the last record was never persisted: organisms that
    // would have seeded there are genuinely missing, so seeding runs for
    // the tail (if it was on before catch-up).
    engine.seeding_enabled = was_seeding;
    let tail = (now_ms - current_ms).max(0) as f64;
    let ticks = engine.clock.ticks_for_elapsed(tail);
    engine.advance(ticks);
    ticks_advanced += ticks;

    // One bulk flush: the new births plus a snapshot of the reconstructed
    // cells, then the checkpoint.
    let mut batch = engine.drain_outbox();
    batch.cells = engine.snapshot_cells();
    batch.flush(store);
    store.set_checkpoint(now_ms);

    CatchUpSummary {
        replayed_records: records.len(),
        ticks_advanced,
        born_during_catchup: engine.total_born() - born_before,
    }
}
