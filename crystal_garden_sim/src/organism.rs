// Organism entities and the post-growth lifecycle state machine.
//
// An organism's phase only ever moves forward: `Growing → Mature →
// Crystallizing → Dissolving → Legacy`. The Growing exit is decided by the
// growth engine (height limit, flowering, or blockage); this module drives
// the three phases after it and the terminal bookkeeping:
//
// - Mature: a passive countdown, scaled by vigor.
// - Crystallizing: each tick converts a uniform random ~40% of the
//   remaining non-Crystal, non-Ash owned cells, without replacement.
// - Dissolving: each tick removes a top-down (descending Y) ~25% slice of
//   the owned cells; the germination cell is retyped to Ash instead of
//   deleted. When nothing above ground remains, a final sweep leaves
//   exactly one ground-level Ash cell — the genoma seed — and the
//   organism enters Legacy owning only that coordinate.
//
// The owned-cell list and the grid are kept mutually consistent on every
// mutation: a dissolved cell leaves both, the preserved seed stays in both.
//
// See also: `growth.rs` for the Growing phase, `engine.rs` for rebirth of
// Legacy organisms, `types.rs` for `Phase`.

use crate::config::{GrowthParams, LifecycleParams};
use crate::genome::{Genome, Genotype};
use crate::grid::VoxelGrid;
use crate::types::{CellKind, GridCoord, OrganismId, Phase};
use crystal_garden_prng::GardenRng;
use serde::{Deserialize, Serialize};

/// A plant organism: a genome, a lifecycle phase, and the set of grid
/// cells it owns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organism {
    pub id: OrganismId,
    pub genome: Genome,
    pub genotype: Genotype,
    pub phase: Phase,
    /// Owned cell coordinates, in placement order.
    pub cells: Vec<GridCoord>,
    /// Absolute height cap for this organism's stems.
    pub height_limit: i32,
    /// Energy accrual multiplier snapshot from the genotype.
    pub vigor: f32,
    /// Growth energy accumulator, shared by all of the organism's tips.
    pub energy: f32,
    /// Ticks remaining in the Mature phase before crystallization.
    pub crystal_countdown: u32,
    /// Where the founding cell was placed; the genoma seed survives here.
    pub germinated_at: GridCoord,
    pub born_tick: u64,
}

impl Organism {
    /// Create a freshly germinated organism. The founding cell itself is
    /// placed by the engine.
    pub fn germinate(
        id: OrganismId,
        genome: Genome,
        coord: GridCoord,
        tick: u64,
        growth: &GrowthParams,
        grid_height: u32,
    ) -> Self {
        let genotype = Genotype::decode(genome);
        let height_limit = (growth.base_max_height * genotype.max_height_factor)
            .round()
            .min((grid_height - 1) as f32) as i32;
        Self {
            id,
            genome,
            genotype,
            phase: Phase::Growing,
            cells: vec![coord],
            height_limit,
            vigor: genotype.vigor,
            energy: growth.initial_energy,
            crystal_countdown: 0,
            germinated_at: coord,
            born_tick: tick,
        }
    }

    /// Leave the Growing phase: start the Mature countdown, scaled so
    /// vigorous organisms crystallize sooner.
    pub fn begin_maturity(&mut self, rng: &mut GardenRng, cfg: &LifecycleParams) {
        self.phase = Phase::Mature;
        let base = rng.range_u32(cfg.mature_duration_min, cfg.mature_duration_max);
        self.crystal_countdown = (base as f32 / self.vigor).round() as u32;
    }
}

/// Advance one organism one lifecycle tick. Returns the new phase if a
/// transition occurred. Growing and Legacy organisms are untouched here.
pub fn advance_lifecycle(
    org: &mut Organism,
    grid: &mut VoxelGrid,
    rng: &mut GardenRng,
    cfg: &LifecycleParams,
) -> Option<Phase> {
    match org.phase {
        Phase::Growing | Phase::Legacy => None,
        Phase::Mature => {
            org.crystal_countdown = org.crystal_countdown.saturating_sub(1);
            if org.crystal_countdown == 0 {
                org.phase = Phase::Crystallizing;
                Some(Phase::Crystallizing)
            } else {
                None
            }
        }
        Phase::Crystallizing => crystallize_step(org, grid, rng, cfg),
        Phase::Dissolving => dissolve_step(org, grid, cfg),
    }
}

/// Convert a uniform random fraction of the remaining convertible cells to
/// Crystal. Transitions to Dissolving once nothing is left to convert.
fn crystallize_step(
    org: &mut Organism,
    grid: &mut VoxelGrid,
    rng: &mut GardenRng,
    cfg: &LifecycleParams,
) -> Option<Phase> {
    let mut convertible: Vec<GridCoord> = org
        .cells
        .iter()
        .copied()
        .filter(|&coord| {
            grid.get(coord)
                .is_some_and(|cell| !matches!(cell.kind, CellKind::Crystal | CellKind::Ash))
        })
        .collect();

    if convertible.is_empty() {
        org.phase = Phase::Dissolving;
        return Some(Phase::Dissolving);
    }

    let count = ((cfg.crystallize_fraction * convertible.len() as f32).ceil() as usize)
        .min(convertible.len());
    // Shuffle-then-take = uniform selection without replacement.
    rng.shuffle(&mut convertible);
    for &coord in &convertible[..count] {
        grid.retype(coord, CellKind::Crystal);
    }
    None
}

/// Remove a top-down slice of the owned cells. Ground-level cells are never
/// deleted mid-phase: the germination cell is retyped to Ash, others wait
/// for the final sweep. Transitions to Legacy once nothing above ground
/// remains.
fn dissolve_step(
    org: &mut Organism,
    grid: &mut VoxelGrid,
    cfg: &LifecycleParams,
) -> Option<Phase> {
    if !org.cells.is_empty() {
        let mut remaining = org.cells.clone();
        remaining.sort_by(|a, b| b.y.cmp(&a.y).then(a.cmp(b)));

        let count =
            ((cfg.dissolve_fraction * remaining.len() as f32).ceil() as usize).min(remaining.len());
        for &coord in &remaining[..count] {
            if coord.y > 0 {
                grid.remove(coord);
                org.cells.retain(|&c| c != coord);
            } else if coord == org.germinated_at {
                grid.retype(coord, CellKind::Ash);
            }
            // Other ground-level cells are left for the final sweep.
        }
    }

    if org.cells.iter().any(|c| c.y > 0) {
        return None;
    }

    // Final sweep: keep exactly one ground-level cell as the genoma seed,
    // preferring the germination coordinate; delete everything else.
    let keeper = if org.cells.contains(&org.germinated_at) {
        Some(org.germinated_at)
    } else {
        org.cells.iter().copied().find(|c| c.y == 0)
    };

    for &coord in &org.cells {
        if Some(coord) != keeper {
            grid.remove(coord);
        }
    }

    match keeper {
        Some(coord) => {
            grid.retype(coord, CellKind::Ash);
            org.cells = vec![coord];
        }
        None => {
            // Germination coordinate was lost before completion — the
            // organism terminates with no surviving seed.
            org.cells.clear();
        }
    }
    org.phase = Phase::Legacy;
    Some(Phase::Legacy)
}
