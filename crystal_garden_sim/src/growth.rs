// Per-tick procedural growth — tips, tropism, branching, leaves.
//
// A growth tip is a transient cursor owned by the growth engine. It exists
// only while its organism is Growing and is removed when the organism
// matures (height limit, flowering, or blockage). Every tick the tip list
// is shuffled and a fixed work budget of tips is processed, so a large
// population degrades evenly instead of starving late registrants.
//
// Tropism: the next voxel is chosen from the unoccupied upper neighbors
// (the 26-neighborhood restricted to Y ≥ current Y) by scoring each
// candidate against a target direction — the tip's inertia blended with a
// pull toward the sun scaled by the genotype's sun sensitivity — plus
// uniform noise. Tests seed the RNG and assert ordering properties, not
// exact coordinates.
//
// See also: `flower.rs` for the bloom triggered when a segment completes,
// `organism.rs` for the phases after Growing, `clock.rs` for the sun
// direction consumed here.

use crate::config::GardenConfig;
use crate::event::{GardenEvent, GardenEventKind};
use crate::flower;
use crate::grid::{Cell, VoxelGrid};
use crate::organism::Organism;
use crate::types::{CellKind, GridCoord, OrganismId, Phase};
use crystal_garden_prng::GardenRng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// An active growth cursor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthTip {
    pub organism: OrganismId,
    pub coord: GridCoord,
    /// Current growth direction, unit length.
    pub dir: [f32; 3],
    /// 0 for trunk tips; branches inherit parent level + 1.
    pub branch_level: u8,
    /// Voxels grown in the current segment.
    pub segment_len: u32,
    /// Randomized per-tip segment limit; reaching it triggers flowering.
    pub segment_max: u32,
}

impl GrowthTip {
    /// The founding tip of a germinated organism: straight up, trunk level.
    pub fn rooted(
        organism: OrganismId,
        coord: GridCoord,
        rng: &mut GardenRng,
        cfg: &GardenConfig,
    ) -> Self {
        Self {
            organism,
            coord,
            dir: [0.0, 1.0, 0.0],
            branch_level: 0,
            segment_len: 0,
            segment_max: rng.range_u32(cfg.growth.segment_min, cfg.growth.segment_max),
        }
    }
}

/// Run one growth tick over the tip list. Mutates organisms (energy, phase),
/// the grid (new stems, leaves, flower volumes), and the tip list itself
/// (dead tips dropped, branch tips appended).
#[allow(clippy::too_many_arguments)]
pub fn run_growth_tick(
    tips: &mut Vec<GrowthTip>,
    organisms: &mut BTreeMap<OrganismId, Organism>,
    grid: &mut VoxelGrid,
    sun: [f32; 3],
    rng: &mut GardenRng,
    cfg: &GardenConfig,
    tick: u64,
    events: &mut Vec<GardenEvent>,
) {
    let mut order: Vec<usize> = (0..tips.len()).collect();
    rng.shuffle(&mut order);

    let mut dead = vec![false; tips.len()];
    let mut spawned: Vec<GrowthTip> = Vec::new();
    let mut processed = 0usize;

    for &idx in &order {
        if processed >= cfg.growth.tip_budget_per_tick {
            break;
        }
        let org_id = tips[idx].organism;
        let Some(org) = organisms.get_mut(&org_id) else {
            dead[idx] = true;
            continue;
        };
        if org.phase != Phase::Growing {
            dead[idx] = true;
            continue;
        }
        processed += 1;

        // Energy accrues whether or not the tip moves this tick.
        org.energy += cfg.growth.energy_per_tick * org.vigor;

        let coord = tips[idx].coord;

        if coord.y >= org.height_limit {
            mature(org, rng, cfg, tick, events);
            dead[idx] = true;
            continue;
        }

        let near_ceiling = coord.y + cfg.growth.ceiling_margin >= grid.height() as i32;
        if tips[idx].segment_len >= tips[idx].segment_max || near_ceiling {
            if flower::bloom(coord, org, grid, rng, &cfg.flowers, tick) {
                events.push(GardenEvent {
                    tick,
                    kind: GardenEventKind::Bloomed {
                        organism: org_id,
                        coord,
                    },
                });
            }
            mature(org, rng, cfg, tick, events);
            dead[idx] = true;
            continue;
        }

        if org.energy < cfg.growth.growth_cost {
            continue;
        }

        // Candidate coordinates: unoccupied upper 26-neighbors.
        let mut candidates: SmallVec<[GridCoord; 17]> = SmallVec::new();
        for dy in 0..=1 {
            for dx in -1..=1 {
                for dz in -1..=1 {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    let neighbor = coord.offset(dx, dy, dz);
                    if grid.is_vacant(neighbor) {
                        candidates.push(neighbor);
                    }
                }
            }
        }

        if candidates.is_empty() {
            // Fully blocked — the organism gives up growing.
            mature(org, rng, cfg, tick, events);
            dead[idx] = true;
            continue;
        }

        // Target direction: inertia (with an upward floor) plus sun pull.
        let mut inherited = tips[idx].dir;
        inherited[1] = inherited[1].max(cfg.growth.min_upward_bias);
        let pull = cfg.growth.sun_pull * org.genotype.sun_sensitivity;
        let target = normalized([
            cfg.growth.direction_inertia * inherited[0] + pull * sun[0],
            cfg.growth.direction_inertia * inherited[1] + pull * sun[1],
            cfg.growth.direction_inertia * inherited[2] + pull * sun[2],
        ]);

        let mut best = candidates[0];
        let mut best_score = f32::MIN;
        for &cand in &candidates {
            let offset = normalized([
                (cand.x - coord.x) as f32,
                (cand.y - coord.y) as f32,
                (cand.z - coord.z) as f32,
            ]);
            let score = offset[0] * target[0]
                + offset[1] * target[1]
                + offset[2] * target[2]
                + rng.range_f32(0.0, cfg.growth.tropism_noise);
            if score > best_score {
                best_score = score;
                best = cand;
            }
        }

        org.energy = 0.0;
        let placed = grid.place(Cell {
            coord: best,
            kind: CellKind::Stem,
            owner: Some(org_id),
            genome: org.genome,
            energy: 0.0,
            age: 0,
            is_tip: true,
            born_tick: tick,
        });
        if !placed {
            // Candidate vanished under us — skip the action for this tick.
            continue;
        }
        if let Some(prev) = grid.get_mut(coord) {
            prev.is_tip = false;
        }
        org.cells.push(best);

        tips[idx].dir = normalized([
            (best.x - coord.x) as f32,
            (best.y - coord.y) as f32,
            (best.z - coord.z) as f32,
        ]);
        tips[idx].coord = best;
        tips[idx].segment_len += 1;

        emit_leaves(org, best, grid, rng, cfg, tick);

        let tip = &tips[idx];
        let interval = if tip.branch_level == 0 {
            cfg.branching.trunk_interval
        } else {
            cfg.branching.branch_interval
        };
        if tip.branch_level < cfg.branching.max_depth
            && tip.segment_len > cfg.branching.min_length
            && tip.segment_len % interval == 0
            && rng.random_bool(f64::from(org.genotype.branch_bias))
        {
            let lateral = normalized([
                tip.dir[0] + rng.range_f32(-1.0, 1.0),
                0.3,
                tip.dir[2] + rng.range_f32(-1.0, 1.0),
            ]);
            spawned.push(GrowthTip {
                organism: org_id,
                coord: tip.coord,
                dir: lateral,
                branch_level: tip.branch_level + 1,
                segment_len: 0,
                segment_max: rng.range_u32(cfg.growth.segment_min, cfg.growth.segment_max),
            });
        }
    }

    // Drop dead tips, plus every tip whose organism left the Growing phase
    // this tick — maturity abruptly terminates the organism's other tips.
    let still_growing = |organism: OrganismId, organisms: &BTreeMap<OrganismId, Organism>| {
        organisms
            .get(&organism)
            .is_some_and(|o| o.phase == Phase::Growing)
    };
    let old = std::mem::take(tips);
    *tips = old
        .into_iter()
        .enumerate()
        .filter(|(i, t)| !dead[*i] && still_growing(t.organism, organisms))
        .map(|(_, t)| t)
        .collect();
    tips.extend(
        spawned
            .into_iter()
            .filter(|t| still_growing(t.organism, organisms)),
    );
}

/// Move an organism out of Growing into Mature.
fn mature(
    org: &mut Organism,
    rng: &mut GardenRng,
    cfg: &GardenConfig,
    tick: u64,
    events: &mut Vec<GardenEvent>,
) {
    org.begin_maturity(rng, &cfg.lifecycle);
    events.push(GardenEvent {
        tick,
        kind: GardenEventKind::PhaseChanged {
            organism: org.id,
            phase: Phase::Mature,
        },
    });
}

/// Roll leaf emission for one growth step and scatter a jittered cluster
/// around the new stem cell, skipping occupied coordinates.
fn emit_leaves(
    org: &mut Organism,
    around: GridCoord,
    grid: &mut VoxelGrid,
    rng: &mut GardenRng,
    cfg: &GardenConfig,
    tick: u64,
) {
    if rng.next_f32() >= org.genotype.leaf_density {
        return;
    }
    let count = u32::from(org.genotype.leaf_size) * cfg.leaves.cluster_factor;
    let j = cfg.leaves.jitter_radius;
    for _ in 0..count {
        let leaf = around.offset(
            rng.range_i32(-j, j + 1),
            rng.range_i32(-j, j + 1),
            rng.range_i32(-j, j + 1),
        );
        let placed = grid.place(Cell {
            coord: leaf,
            kind: CellKind::Leaf,
            owner: Some(org.id),
            genome: org.genome,
            energy: 0.0,
            age: 0,
            is_tip: false,
            born_tick: tick,
        });
        if placed {
            org.cells.push(leaf);
        }
    }
}

/// Normalize, falling back to straight up for degenerate input.
fn normalized(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len < 1e-6 {
        [0.0, 1.0, 0.0]
    } else {
        [v[0] / len, v[1] / len, v[2] / len]
    }
}
