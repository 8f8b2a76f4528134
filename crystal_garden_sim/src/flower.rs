// Flower volume generation.
//
// When a tip completes its segment (or runs out of sky) it blooms: the tip
// cell itself becomes a Flower, then an organic volume grows around it by
// randomized flood-fill. The fill picks a random frontier cell and extends
// it one step along a random axis, bounded by a per-bloom random ellipsoid,
// until a target volume or a safety iteration cap is reached. Occupied and
// out-of-bounds coordinates are simply skipped — flowers mould themselves
// around whatever is already there.
//
// See also: `growth.rs` for the trigger conditions, `config.rs` for
// `FlowerParams`.

use crate::config::FlowerParams;
use crate::grid::{Cell, VoxelGrid};
use crate::organism::Organism;
use crate::types::{CellKind, GridCoord, Phase};
use crystal_garden_prng::GardenRng;

const AXIS_DIRS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Grow a flower volume around `origin`. Returns false without touching the
/// grid if the organism already left the Growing phase — a stale tip must
/// not bloom.
pub fn bloom(
    origin: GridCoord,
    org: &mut Organism,
    grid: &mut VoxelGrid,
    rng: &mut GardenRng,
    cfg: &FlowerParams,
    tick: u64,
) -> bool {
    if org.phase != Phase::Growing {
        return false;
    }

    // The tip cell itself becomes the flower's heart — a sanctioned
    // same-coordinate transition.
    if !grid.retype(origin, CellKind::Flower) {
        return false;
    }

    let hx = rng.range_f32(cfg.half_extent_min, cfg.half_extent_max);
    let hy = rng.range_f32(cfg.half_extent_min, cfg.half_extent_max);
    let hz = rng.range_f32(cfg.half_extent_min, cfg.half_extent_max);
    let bounding_volume = (2.0 * hx) * (2.0 * hy) * (2.0 * hz);
    let target = (cfg.volume_fraction * bounding_volume) as usize;

    let mut frontier: Vec<GridCoord> = vec![origin];
    let mut placed = 1usize;

    for _ in 0..cfg.max_iterations {
        if placed >= target || frontier.is_empty() {
            break;
        }
        let from = frontier[rng.range_usize(0, frontier.len())];
        let (dx, dy, dz) = AXIS_DIRS[rng.range_usize(0, AXIS_DIRS.len())];
        let next = from.offset(dx, dy, dz);

        if !inside_ellipsoid(next, origin, hx, hy, hz) {
            continue;
        }
        let ok = grid.place(Cell {
            coord: next,
            kind: CellKind::Flower,
            owner: Some(org.id),
            genome: org.genome,
            energy: 0.0,
            age: 0,
            is_tip: false,
            born_tick: tick,
        });
        if ok {
            org.cells.push(next);
            frontier.push(next);
            placed += 1;
        }
    }
    true
}

fn inside_ellipsoid(coord: GridCoord, center: GridCoord, hx: f32, hy: f32, hz: f32) -> bool {
    let dx = (coord.x - center.x) as f32 / hx;
    let dy = (coord.y - center.y) as f32 / hy;
    let dz = (coord.z - center.z) as f32 / hz;
    dx * dx + dy * dy + dz * dz <= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GardenConfig;
    use crate::genome::Genome;
    use crate::types::OrganismId;

    fn bloom_setup(seed: u64) -> (VoxelGrid, Organism, GardenRng, GardenConfig) {
        let cfg = GardenConfig::compact();
        let mut grid = VoxelGrid::new(32, 32, 32);
        let genome = Genome::from_hex("0a1b2c3d4e5f");
        let origin = GridCoord::new(16, 10, 16);
        let org = Organism::germinate(
            OrganismId(1),
            genome,
            GridCoord::new(16, 0, 16),
            0,
            &cfg.growth,
            32,
        );
        grid.place(Cell {
            coord: origin,
            kind: CellKind::Stem,
            owner: Some(org.id),
            genome,
            energy: 0.0,
            age: 0,
            is_tip: true,
            born_tick: 0,
        });
        (grid, org, GardenRng::new(seed), cfg)
    }

    #[test]
    fn bloom_converts_the_tip_and_grows_a_volume() {
        let (mut grid, mut org, mut rng, cfg) = bloom_setup(42);
        let origin = GridCoord::new(16, 10, 16);

        assert!(bloom(origin, &mut org, &mut grid, &mut rng, &cfg.flowers, 5));
        assert_eq!(grid.get(origin).unwrap().kind, CellKind::Flower);
        assert!(
            grid.kind_count(CellKind::Flower) > 1,
            "flood fill should add cells beyond the origin"
        );
        // Every flower cell is inside the configured maximum extent.
        let max = cfg.flowers.half_extent_max.ceil() as i32;
        for cell in grid.iter() {
            if cell.kind == CellKind::Flower {
                assert!((cell.coord.x - origin.x).abs() <= max);
                assert!((cell.coord.y - origin.y).abs() <= max);
                assert!((cell.coord.z - origin.z).abs() <= max);
            }
        }
        // Grown cells joined the owned list.
        assert!(org.cells.len() > 1);
    }

    #[test]
    fn stale_tip_does_not_bloom() {
        let (mut grid, mut org, mut rng, cfg) = bloom_setup(42);
        let origin = GridCoord::new(16, 10, 16);
        org.phase = Phase::Mature;

        assert!(!bloom(origin, &mut org, &mut grid, &mut rng, &cfg.flowers, 5));
        assert_eq!(grid.get(origin).unwrap().kind, CellKind::Stem);
        assert_eq!(grid.kind_count(CellKind::Flower), 0);
    }

    #[test]
    fn bloom_is_deterministic_per_seed() {
        let run = |seed| {
            let (mut grid, mut org, mut rng, cfg) = bloom_setup(seed);
            bloom(
                GridCoord::new(16, 10, 16),
                &mut org,
                &mut grid,
                &mut rng,
                &cfg.flowers,
                5,
            );
            let mut coords: Vec<GridCoord> = grid
                .iter()
                .filter(|c| c.kind == CellKind::Flower)
                .map(|c| c.coord)
                .collect();
            coords.sort();
            coords
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn bloom_skips_occupied_cells() {
        let (mut grid, mut org, mut rng, cfg) = bloom_setup(42);
        let origin = GridCoord::new(16, 10, 16);
        // Pre-occupy a shell cell next to the origin.
        let blocker = origin.offset(1, 0, 0);
        grid.place(Cell {
            coord: blocker,
            kind: CellKind::Crystal,
            owner: None,
            genome: Genome::from_hex("0"),
            energy: 0.0,
            age: 0,
            is_tip: false,
            born_tick: 0,
        });

        bloom(origin, &mut org, &mut grid, &mut rng, &cfg.flowers, 5);
        // The blocker was never overwritten.
        assert_eq!(grid.get(blocker).unwrap().kind, CellKind::Crystal);
    }
}
