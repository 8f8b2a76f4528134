// Commands — the only external mutations to the engine.
//
// Outside code changes the simulation exclusively by submitting commands;
// everything else (growth, lifecycle, seeding) is internal and driven by
// ticks. Invalid commands are silent no-ops — planting on an occupied or
// out-of-bounds coordinate skips the action rather than erroring, the same
// policy the growth engine applies to blocked coordinates.
//
// `PlantSeed` doubles as the deterministic germination primitive: the
// catch-up controller and the lifecycle tests use it to place organisms at
// known coordinates with known genomes.
//
// See also: `engine.rs` for `apply()`/`run()` which dispatch these,
// `genome.rs` for the identifier type carried by `PlantSeed`.

use crate::genome::Genome;
use serde::{Deserialize, Serialize};

/// A command targeting a specific simulation tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GardenCommand {
    pub tick: u64,
    pub action: GardenAction,
}

/// The specific action a command performs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GardenAction {
    /// Germinate an organism with the given genome at ground level.
    /// No-op if `(x, 0, z)` is occupied or out of bounds.
    PlantSeed { genome: Genome, x: i32, z: i32 },
    /// Set the clock rate multiplier (0 = paused).
    SetRate { rate: f64 },
    /// Enable or disable spontaneous seeding.
    SetSeeding { enabled: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_serialization_roundtrip() {
        let cmd = GardenCommand {
            tick: 100,
            action: GardenAction::PlantSeed {
                genome: Genome::from_hex("ffffff000000"),
                x: 10,
                z: 10,
            },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let restored: GardenCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.tick, 100);
        assert_eq!(json, serde_json::to_string(&restored).unwrap());
    }
}
