// Narrative events emitted by the simulation.
//
// Each engine step returns the events it produced. They are output only —
// the UI and the event log consume them; nothing inside the sim reads them
// back. External consumers never mutate engine state: events plus the
// read-only snapshot surface are the whole outbound contract.
//
// See also: `engine.rs` for the tick loop that emits these, `persist.rs`
// for the separate durable records (birth/cell) sent to the store.

use crate::genome::Genome;
use crate::types::{GridCoord, OrganismId, Phase};
use serde::{Deserialize, Serialize};

/// A narrative event, stamped with the tick it occurred on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GardenEvent {
    pub tick: u64,
    pub kind: GardenEventKind,
}

/// Types of narrative events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GardenEventKind {
    /// A new organism germinated (spontaneous seed or planted).
    Germinated {
        organism: OrganismId,
        genome: Genome,
        coord: GridCoord,
    },
    /// A Legacy organism's ash seed reinitialized under a new id.
    Reborn {
        organism: OrganismId,
        predecessor: OrganismId,
        coord: GridCoord,
    },
    /// An organism moved to a later lifecycle phase.
    PhaseChanged { organism: OrganismId, phase: Phase },
    /// A growth tip bloomed into a flower volume.
    Bloomed { organism: OrganismId, coord: GridCoord },
    /// The external rate multiplier changed.
    RateChanged { rate: f64 },
    /// Spontaneous seeding was enabled or disabled.
    SeedingToggled { enabled: bool },
}
