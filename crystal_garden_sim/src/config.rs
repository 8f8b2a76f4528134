// Data-driven simulation configuration.
//
// Every tunable parameter lives in `GardenConfig`, grouped into nested
// parameter structs. The sim never uses magic numbers — growth, branching,
// flowering, lifecycle timing, and seeding all read from the config, which
// enables balance iteration without touching sim logic.
//
// Named preset constructors produce different world archetypes:
// - `default()`: the standard 100³ garden.
// - `compact()`: a small 32³ world with faster lifecycle timing, for tests
//   and benches that want organisms to complete a full lifecycle quickly.
//
// See also: `engine.rs` which owns the config as part of the engine state,
// `growth.rs`/`flower.rs`/`organism.rs` which read their parameter groups,
// `genome.rs` for the per-organism traits that multiply these base values.
//
// **Critical constraint: determinism.** Config values feed directly into
// simulation logic; replays must run under the config they were recorded
// with.

use serde::{Deserialize, Serialize};

/// Controls energy accounting and tropism for growth tips.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthParams {
    /// Energy accrued per tick per active tip, before the vigor multiplier.
    pub energy_per_tick: f32,
    /// Energy consumed to grow one voxel.
    pub growth_cost: f32,
    /// Energy buffer a founding cell germinates with.
    pub initial_energy: f32,
    /// Maximum tips processed per tick; the tip list is shuffled first so
    /// no organism is starved systematically.
    pub tip_budget_per_tick: usize,
    /// Base height limit in voxels, scaled per organism by the genotype's
    /// `max_height_factor`.
    pub base_max_height: f32,
    /// Tips this close to the world ceiling flower instead of growing.
    pub ceiling_margin: i32,
    /// Weight of the tip's current direction in the tropism target.
    pub direction_inertia: f32,
    /// Minimum upward component enforced on the inherited direction.
    pub min_upward_bias: f32,
    /// Fixed coefficient on the sun pull, multiplied by the genotype's
    /// `sun_sensitivity`.
    pub sun_pull: f32,
    /// Upper bound of the uniform noise added to each candidate's score.
    pub tropism_noise: f32,
    /// Randomized per-tip segment length is drawn from
    /// `[segment_min, segment_max)`.
    pub segment_min: u32,
    pub segment_max: u32,
}

/// Controls when tips spawn child branches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BranchParams {
    /// Maximum branch depth. Trunk tips are level 0.
    pub max_depth: u8,
    /// A trunk tip attempts a branch every this many segments.
    pub trunk_interval: u32,
    /// A branch tip attempts every this many segments.
    pub branch_interval: u32,
    /// No branching before the segment is this long.
    pub min_length: u32,
}

/// Controls leaf cluster emission during growth.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeafParams {
    /// Candidate leaf cells per emission = genotype `leaf_size` × this.
    pub cluster_factor: u32,
    /// Leaf cells jitter within this many voxels of the new stem cell.
    pub jitter_radius: i32,
}

/// Controls the flower volume grown when a tip blooms.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowerParams {
    /// Ellipsoid half-extents are drawn per axis from
    /// `[half_extent_min, half_extent_max)`.
    pub half_extent_min: f32,
    pub half_extent_max: f32,
    /// Target flower volume as a fraction of the ellipsoid's bounding box.
    pub volume_fraction: f32,
    /// Safety cap on flood-fill iterations.
    pub max_iterations: u32,
}

/// Controls post-growth lifecycle timing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleParams {
    /// Mature-phase countdown is drawn from
    /// `[mature_duration_min, mature_duration_max)` ticks, then divided by
    /// the organism's vigor — vigorous organisms crystallize sooner.
    pub mature_duration_min: u32,
    pub mature_duration_max: u32,
    /// Fraction of remaining convertible cells crystallized per tick.
    pub crystallize_fraction: f32,
    /// Fraction of remaining owned cells processed per dissolution tick.
    pub dissolve_fraction: f32,
}

/// Controls spontaneous seeding and rebirth.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedingParams {
    /// Per-tick probability of attempting one spontaneous seed.
    pub seed_chance: f64,
    /// Per-tick probability that a Legacy organism's ash seed reinitializes.
    pub rebirth_chance: f64,
    /// Attempts to find an empty ground coordinate before giving up.
    pub placement_retries: u32,
}

/// Complete garden configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GardenConfig {
    /// Lattice dimensions (width, height, depth). Memory scales with
    /// occupied cells, not with this volume.
    pub grid_size: (u32, u32, u32),
    pub growth: GrowthParams,
    pub branching: BranchParams,
    pub leaves: LeafParams,
    pub flowers: FlowerParams,
    pub lifecycle: LifecycleParams,
    pub seeding: SeedingParams,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            grid_size: (100, 100, 100),
            growth: GrowthParams {
                energy_per_tick: 25.0,
                growth_cost: 40.0,
                initial_energy: 40.0,
                tip_budget_per_tick: 60,
                base_max_height: 24.0,
                ceiling_margin: 5,
                direction_inertia: 0.85,
                min_upward_bias: 0.15,
                sun_pull: 0.35,
                tropism_noise: 0.3,
                segment_min: 8,
                segment_max: 20,
            },
            branching: BranchParams {
                max_depth: 2,
                trunk_interval: 12,
                branch_interval: 8,
                min_length: 5,
            },
            leaves: LeafParams {
                cluster_factor: 3,
                jitter_radius: 2,
            },
            flowers: FlowerParams {
                half_extent_min: 2.0,
                half_extent_max: 6.0,
                volume_fraction: 0.4,
                max_iterations: 500,
            },
            lifecycle: LifecycleParams {
                mature_duration_min: 60,
                mature_duration_max: 180,
                crystallize_fraction: 0.4,
                dissolve_fraction: 0.25,
            },
            seeding: SeedingParams {
                seed_chance: 0.02,
                rebirth_chance: 0.005,
                placement_retries: 8,
            },
        }
    }
}

impl GardenConfig {
    /// Small, fast world for tests and benches: organisms hit their height
    /// limits and complete the whole lifecycle within a few hundred ticks.
    pub fn compact() -> Self {
        Self {
            grid_size: (32, 32, 32),
            growth: GrowthParams {
                base_max_height: 12.0,
                ..Self::default().growth
            },
            lifecycle: LifecycleParams {
                mature_duration_min: 10,
                mature_duration_max: 30,
                ..Self::default().lifecycle
            },
            seeding: SeedingParams {
                seed_chance: 0.1,
                rebirth_chance: 0.02,
                ..Self::default().seeding
            },
            ..Self::default()
        }
    }
}
