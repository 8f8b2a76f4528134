// The engine aggregate — single source of truth for one garden.
//
// `Engine` owns the grid, the organism registry, the tip list, the clock,
// the PRNG, and the config. It is an explicit value, not ambient state:
// tests run as many independent engines as they like. External code mutates
// it only through commands; renderers and persistence read snapshots and
// drain the outbox, never touching state directly.
//
// One tick executes in fixed order: **seeding → rebirth → growth →
// lifecycle**, then the clock advances. Nothing observes a partially
// applied tick; catch-up interrupts safely at tick boundaries because each
// tick leaves the grid self-consistent.
//
// ## Save/load
//
// `Engine` serializes to JSON via serde. Two transient pieces are
// `#[serde(skip)]` and rebuilt after deserialization through
// `rebuild_transient_state()`: the grid's per-kind counters and the
// persistence outbox (pending writes are flushed separately, not carried
// inside snapshots).
//
// See also: `growth.rs` for the Growing phase, `organism.rs` for the rest
// of the lifecycle, `catchup.rs` for state reconstruction from a store,
// `command.rs` for the mutation surface, `clock.rs` for tick/time ratios.
//
// **Critical constraint: determinism.** All randomness flows through the
// engine's seeded `GardenRng`; iteration over the registry uses `BTreeMap`
// order. Same seed + same commands + same tick count = same state.

use crate::command::{GardenAction, GardenCommand};
use crate::config::GardenConfig;
use crate::event::{GardenEvent, GardenEventKind};
use crate::genome::Genome;
use crate::grid::{Cell, VoxelGrid};
use crate::growth::{self, GrowthTip};
use crate::organism::{self, Organism};
use crate::persist::{BirthRecord, CellRecord, WriteBatch};
use crate::types::{CellKind, GridCoord, OrganismId, Phase};
use crate::clock::SimClock;
use crystal_garden_prng::GardenRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Read-only population statistics for the UI.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GardenStats {
    /// Organisms ever germinated (live, replayed, and reborn).
    pub total_born: u64,
    /// Organisms not yet in the Legacy phase.
    pub active_count: usize,
    /// Distinct genomes ever seen by this engine.
    pub unique_genome_count: usize,
    /// Occupied-cell counts indexed by `CellKind::index()`.
    pub cell_counts: [u64; CellKind::COUNT],
}

impl GardenStats {
    pub const fn count(&self, kind: CellKind) -> u64 {
        self.cell_counts[kind.index()]
    }
}

/// A complete garden simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Engine {
    /// Current simulation tick.
    pub tick: u64,

    /// The engine's deterministic PRNG.
    pub rng: GardenRng,

    /// Simulation parameters (immutable after construction).
    pub config: GardenConfig,

    /// Day/night clock, rate multiplier, and simulated timestamp.
    pub clock: SimClock,

    /// Whether spontaneous seeding runs each tick. Catch-up disables it
    /// while replaying persisted births.
    pub seeding_enabled: bool,

    /// All organisms ever registered, keyed by id. BTreeMap for
    /// deterministic iteration.
    pub organisms: BTreeMap<OrganismId, Organism>,

    /// Active growth tips (Growing-phase organisms only).
    pub tips: Vec<GrowthTip>,

    /// The sparse voxel lattice.
    pub grid: VoxelGrid,

    next_organism_id: u64,
    total_born: u64,
    known_genomes: BTreeSet<Genome>,

    /// Pending durable records. Not part of snapshots — the host drains
    /// and flushes these independently of save/load.
    #[serde(skip)]
    outbox: WriteBatch,
}

impl Engine {
    /// New garden with the default config.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GardenConfig::default())
    }

    pub fn with_config(seed: u64, config: GardenConfig) -> Self {
        let (w, h, d) = config.grid_size;
        Self {
            tick: 0,
            rng: GardenRng::new(seed),
            config,
            clock: SimClock::new(),
            seeding_enabled: true,
            organisms: BTreeMap::new(),
            tips: Vec::new(),
            grid: VoxelGrid::new(w, h, d),
            next_organism_id: 0,
            total_born: 0,
            known_genomes: BTreeSet::new(),
            outbox: WriteBatch::default(),
        }
    }

    // -----------------------------------------------------------------
    // Tick loop
    // -----------------------------------------------------------------

    /// Advance one tick in the fixed order seeding → rebirth → growth →
    /// lifecycle, returning the narrative events produced.
    pub fn step(&mut self) -> Vec<GardenEvent> {
        let mut events = Vec::new();

        self.spontaneous_seed(&mut events);
        self.rebirth(&mut events);
        growth::run_growth_tick(
            &mut self.tips,
            &mut self.organisms,
            &mut self.grid,
            self.clock.sun_direction(),
            &mut self.rng,
            &self.config,
            self.tick,
            &mut events,
        );
        self.lifecycle(&mut events);
        self.grid.age_cells();

        self.tick += 1;
        self.clock.advance_tick();
        events
    }

    /// Batch mode: advance `n` ticks. Catch-up uses this between records.
    pub fn advance(&mut self, n: u64) -> Vec<GardenEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.append(&mut self.step());
        }
        events
    }

    /// Advance by elapsed real time at the current clock rate.
    pub fn advance_elapsed(&mut self, elapsed_ms: f64) -> Vec<GardenEvent> {
        let ticks = self.clock.ticks_for_elapsed(elapsed_ms);
        self.advance(ticks)
    }

    /// Apply a batch of commands (sorted by tick) while advancing to
    /// `target_tick`.
    pub fn run(&mut self, commands: &[GardenCommand], target_tick: u64) -> Vec<GardenEvent> {
        let mut events = Vec::new();
        let mut idx = 0;
        while self.tick < target_tick {
            while idx < commands.len() && commands[idx].tick <= self.tick {
                self.apply_action(&commands[idx].action, &mut events);
                idx += 1;
            }
            events.append(&mut self.step());
        }
        while idx < commands.len() && commands[idx].tick <= self.tick {
            self.apply_action(&commands[idx].action, &mut events);
            idx += 1;
        }
        events
    }

    /// Apply a single command immediately.
    pub fn apply(&mut self, cmd: &GardenCommand) -> Vec<GardenEvent> {
        let mut events = Vec::new();
        self.apply_action(&cmd.action, &mut events);
        events
    }

    fn apply_action(&mut self, action: &GardenAction, events: &mut Vec<GardenEvent>) {
        match action {
            GardenAction::PlantSeed { genome, x, z } => {
                let _ = self.germinate(*genome, GridCoord::new(*x, 0, *z), true, events);
            }
            GardenAction::SetRate { rate } => {
                self.clock.set_rate(*rate);
                events.push(GardenEvent {
                    tick: self.tick,
                    kind: GardenEventKind::RateChanged {
                        rate: self.clock.rate(),
                    },
                });
            }
            GardenAction::SetSeeding { enabled } => {
                self.seeding_enabled = *enabled;
                events.push(GardenEvent {
                    tick: self.tick,
                    kind: GardenEventKind::SeedingToggled { enabled: *enabled },
                });
            }
        }
    }

    // -----------------------------------------------------------------
    // Germination, seeding, rebirth
    // -----------------------------------------------------------------

    fn alloc_id(&mut self) -> OrganismId {
        let id = OrganismId(self.next_organism_id);
        self.next_organism_id += 1;
        id
    }

    /// Germinate a new organism at a ground coordinate. Silent no-op
    /// (returns `None`) if the coordinate is occupied or out of bounds.
    /// `record` controls whether a birth record enters the outbox —
    /// replayed organisms are already persisted and are not re-recorded.
    fn germinate(
        &mut self,
        genome: Genome,
        coord: GridCoord,
        record: bool,
        events: &mut Vec<GardenEvent>,
    ) -> Option<OrganismId> {
        let id = self.alloc_id();
        self.germinate_with_id(id, genome, coord, record, events)
    }

    fn germinate_with_id(
        &mut self,
        id: OrganismId,
        genome: Genome,
        coord: GridCoord,
        record: bool,
        events: &mut Vec<GardenEvent>,
    ) -> Option<OrganismId> {
        if !self.grid.is_vacant(coord) {
            return None;
        }
        let org = Organism::germinate(
            id,
            genome,
            coord,
            self.tick,
            &self.config.growth,
            self.grid.height(),
        );
        let placed = self.grid.place(Cell {
            coord,
            kind: CellKind::Stem,
            owner: Some(id),
            genome,
            energy: self.config.growth.initial_energy,
            age: 0,
            is_tip: true,
            born_tick: self.tick,
        });
        if !placed {
            return None;
        }
        self.tips
            .push(GrowthTip::rooted(id, coord, &mut self.rng, &self.config));
        self.organisms.insert(id, org);
        self.register_birth(id, genome, coord, record, false);
        events.push(GardenEvent {
            tick: self.tick,
            kind: GardenEventKind::Germinated {
                organism: id,
                genome,
                coord,
            },
        });
        Some(id)
    }

    fn register_birth(
        &mut self,
        id: OrganismId,
        genome: Genome,
        coord: GridCoord,
        record: bool,
        dissolved: bool,
    ) {
        self.total_born += 1;
        self.known_genomes.insert(genome);
        if record {
            self.outbox.births.push(BirthRecord {
                organism: id,
                genome,
                x: coord.x,
                z: coord.z,
                timestamp_ms: self.clock.timestamp_ms(),
                dissolved,
            });
        }
    }

    /// Reconstruct an organism from a persisted birth record, reusing its
    /// recorded id. Already-dissolved organisms come back as a lone ash
    /// seed in the Legacy phase. Occupied coordinates skip the placement
    /// (the record stays persisted; nothing is re-recorded here).
    pub(crate) fn restore(&mut self, record: &BirthRecord, events: &mut Vec<GardenEvent>) {
        self.next_organism_id = self.next_organism_id.max(record.organism.0 + 1);
        let coord = GridCoord::new(record.x, 0, record.z);
        if record.dissolved {
            let placed = self.grid.place(Cell {
                coord,
                kind: CellKind::Ash,
                owner: Some(record.organism),
                genome: record.genome,
                energy: 0.0,
                age: 0,
                is_tip: false,
                born_tick: self.tick,
            });
            if !placed {
                return;
            }
            let mut org = Organism::germinate(
                record.organism,
                record.genome,
                coord,
                self.tick,
                &self.config.growth,
                self.grid.height(),
            );
            org.phase = Phase::Legacy;
            self.organisms.insert(record.organism, org);
            self.register_birth(record.organism, record.genome, coord, false, true);
        } else {
            let _ = self.germinate_with_id(record.organism, record.genome, coord, false, events);
        }
    }

    /// Spontaneous seeding: with `seed_chance`, try a bounded number of
    /// random ground coordinates and germinate a fresh random genome at
    /// the first empty one.
    fn spontaneous_seed(&mut self, events: &mut Vec<GardenEvent>) {
        if !self.seeding_enabled || !self.rng.random_bool(self.config.seeding.seed_chance) {
            return;
        }
        for _ in 0..self.config.seeding.placement_retries {
            let x = self.rng.range_i32(0, self.grid.width() as i32);
            let z = self.rng.range_i32(0, self.grid.depth() as i32);
            let coord = GridCoord::new(x, 0, z);
            if self.grid.is_vacant(coord) {
                let genome = Genome::random(&mut self.rng);
                let _ = self.germinate(genome, coord, true, events);
                return;
            }
        }
    }

    /// Rebirth: each Legacy organism with a surviving ash seed has a small
    /// chance of reinitializing — same genome, same coordinate, brand-new
    /// id. Genetic continuity, not entity continuity.
    fn rebirth(&mut self, events: &mut Vec<GardenEvent>) {
        let chance = self.config.seeding.rebirth_chance;
        let mut candidates: Vec<(OrganismId, GridCoord, Genome)> = Vec::new();
        for org in self.organisms.values() {
            if org.phase != Phase::Legacy || org.cells.len() != 1 {
                continue;
            }
            let coord = org.cells[0];
            let has_seed = self
                .grid
                .get(coord)
                .is_some_and(|c| c.kind == CellKind::Ash && c.owner == Some(org.id));
            if has_seed && self.rng.random_bool(chance) {
                candidates.push((org.id, coord, org.genome));
            }
        }
        for (old_id, coord, genome) in candidates {
            // The old organism relinquishes its seed; the ash cell is
            // overwritten by the newborn's founding stem.
            if let Some(old) = self.organisms.get_mut(&old_id) {
                old.cells.clear();
            }
            self.grid.remove(coord);
            if let Some(new_id) = self.germinate(genome, coord, true, events) {
                events.push(GardenEvent {
                    tick: self.tick,
                    kind: GardenEventKind::Reborn {
                        organism: new_id,
                        predecessor: old_id,
                        coord,
                    },
                });
            }
        }
    }

    /// Advance every organism's post-growth lifecycle.
    fn lifecycle(&mut self, events: &mut Vec<GardenEvent>) {
        let ids: Vec<OrganismId> = self.organisms.keys().copied().collect();
        for id in ids {
            let Some(org) = self.organisms.get_mut(&id) else {
                continue;
            };
            if let Some(phase) = organism::advance_lifecycle(
                org,
                &mut self.grid,
                &mut self.rng,
                &self.config.lifecycle,
            ) {
                events.push(GardenEvent {
                    tick: self.tick,
                    kind: GardenEventKind::PhaseChanged {
                        organism: id,
                        phase,
                    },
                });
            }
        }
    }

    // -----------------------------------------------------------------
    // Read surface and persistence
    // -----------------------------------------------------------------

    pub fn stats(&self) -> GardenStats {
        let mut cell_counts = [0u64; CellKind::COUNT];
        for kind in [
            CellKind::Stem,
            CellKind::Leaf,
            CellKind::Flower,
            CellKind::Crystal,
            CellKind::Ash,
        ] {
            cell_counts[kind.index()] = self.grid.kind_count(kind);
        }
        GardenStats {
            total_born: self.total_born,
            active_count: self
                .organisms
                .values()
                .filter(|o| o.phase != Phase::Legacy)
                .count(),
            unique_genome_count: self.known_genomes.len(),
            cell_counts,
        }
    }

    pub const fn total_born(&self) -> u64 {
        self.total_born
    }

    /// Read-only iteration over occupied cells. Genotype colors come from
    /// `Genotype::decode(cell.genome)` — pure, so renderers may cache by
    /// genome.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.iter()
    }

    /// Coordinate lookup for pick/hover queries.
    pub fn cell_at(&self, coord: GridCoord) -> Option<&Cell> {
        self.grid.get(coord)
    }

    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.organisms.get(&id)
    }

    /// Take all pending durable records.
    pub fn drain_outbox(&mut self) -> WriteBatch {
        std::mem::take(&mut self.outbox)
    }

    /// Snapshot the current grid as cell records, sorted by coordinate
    /// for deterministic output.
    pub fn snapshot_cells(&self) -> Vec<CellRecord> {
        let mut records: Vec<CellRecord> = self
            .grid
            .iter()
            .map(|cell| CellRecord {
                organism: cell.owner.unwrap_or(OrganismId(u64::MAX)),
                coord: cell.coord,
                kind: cell.kind,
            })
            .collect();
        records.sort_by_key(|r| r.coord);
        records
    }

    // -----------------------------------------------------------------
    // Save/load
    // -----------------------------------------------------------------

    /// Rebuild all transient (`#[serde(skip)]`) state after
    /// deserialization.
    pub fn rebuild_transient_state(&mut self) {
        self.grid.rebuild_counts();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut engine: Self = serde_json::from_str(json)?;
        engine.rebuild_transient_state();
        Ok(engine)
    }
}
