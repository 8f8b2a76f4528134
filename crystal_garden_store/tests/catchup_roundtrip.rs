// End-to-end persistence round trip: run a live garden against a journal,
// shut down, reopen, and catch a fresh engine up from the file.

use crystal_garden_sim::catchup::catch_up;
use crystal_garden_sim::config::GardenConfig;
use crystal_garden_sim::engine::Engine;
use crystal_garden_sim::persist::GardenStore;
use crystal_garden_sim::types::GridCoord;
use crystal_garden_store::JournalStore;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn scratch_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "crystal_garden_roundtrip_{tag}_{}_{nanos}.jsonl",
        std::process::id()
    ))
}

#[test]
fn live_session_then_catch_up_from_journal() {
    let path = scratch_path("session");

    // --- Session one: live play, write-behind persistence. ---
    let first_session_births;
    {
        let mut store = JournalStore::open(&path).expect("open journal");
        let mut engine = Engine::with_config(42, GardenConfig::compact());
        engine.clock.set_rate(50_000.0);
        engine.clock.set_timestamp(1_000_000);

        for _ in 0..400 {
            engine.step();
        }
        let batch = engine.drain_outbox();
        first_session_births = batch.births.clone();
        assert!(
            !first_session_births.is_empty(),
            "compact seeding over 400 ticks should germinate organisms"
        );
        batch.flush(&mut store);
        store.set_checkpoint(engine.clock.timestamp_ms());
        store.close();
    }

    // --- Session two: reconstruct from the journal. ---
    let mut store = JournalStore::open(&path).expect("reopen journal");
    assert_eq!(store.births_by_time().len(), first_session_births.len());
    let resume_from = store.checkpoint().expect("checkpoint was persisted");

    let mut engine = Engine::with_config(43, GardenConfig::compact());
    engine.clock.set_rate(50_000.0);
    let now = resume_from + 120_000; // two offline minutes
    let summary = catch_up(&mut engine, &mut store, now);

    assert_eq!(summary.replayed_records, first_session_births.len());
    assert!(summary.ticks_advanced > 0);

    // Every persisted birth is either restored — an organism with the
    // recorded genome at the recorded coordinate — or was skipped because
    // replayed growth (which differs in shape from the live run) had
    // already occupied its ground cell.
    let mut restored = 0;
    for record in &first_session_births {
        match engine.organism(record.organism) {
            Some(org) => {
                assert_eq!(org.genome, record.genome);
                assert_eq!(org.germinated_at, GridCoord::new(record.x, 0, record.z));
                restored += 1;
            }
            None => {
                let coord = GridCoord::new(record.x, 0, record.z);
                assert!(
                    engine.cell_at(coord).is_some(),
                    "record for {} skipped without an occupying cell at {coord}",
                    record.organism
                );
            }
        }
    }
    assert!(restored > 0, "at least some records must replay cleanly");

    // The catch-up flush appended its own records and a new checkpoint.
    assert_eq!(store.checkpoint(), Some(now));
    assert!(!store.all_cells().is_empty());

    let _ = std::fs::remove_file(&path);
}
