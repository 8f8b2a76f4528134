// Core types shared across the simulation.
//
// Defines spatial coordinates (`GridCoord`), the organism identifier, the
// cell and phase discriminants, and the display color triple. All types
// derive `Serialize`/`Deserialize` for snapshot save/load.
//
// Organism IDs are plain monotonic integers handed out by the engine, not
// UUIDs: the registry is per-engine-instance, and monotonic IDs double as a
// deterministic tiebreaker wherever iteration order matters.
//
// See also: `grid.rs` for the `Cell` record stored per coordinate,
// `organism.rs` for the entity that owns cells, `genome.rs` for the trait
// types attached to every cell.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position in the 3D voxel lattice. Y is up; ground level is y = 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// This coordinate displaced by the given offsets.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Entity identifier
// ---------------------------------------------------------------------------

/// Unique, monotonically increasing organism identifier.
///
/// A rebirth registers a brand-new id — the old organism is never revived,
/// only its genome carries over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganismId(pub u64);

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrganismId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Discriminants
// ---------------------------------------------------------------------------

/// The material of a single occupied cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Stem,
    Leaf,
    Flower,
    Crystal,
    Ash,
}

impl CellKind {
    /// Number of kinds — sizes the per-kind counter array in the grid.
    pub const COUNT: usize = 5;

    /// Stable index for counter arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::Stem => 0,
            Self::Leaf => 1,
            Self::Flower => 2,
            Self::Crystal => 3,
            Self::Ash => 4,
        }
    }
}

/// Organism lifecycle phase.
///
/// The only legal order is `Growing → Mature → Crystallizing → Dissolving →
/// Legacy` (phases may be skipped, never revisited). `Ord` follows that
/// order so monotonicity can be asserted directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Growing,
    Mature,
    Crystallizing,
    Dissolving,
    Legacy,
}

// ---------------------------------------------------------------------------
// Display color
// ---------------------------------------------------------------------------

/// An 8-bit RGB color derived from a genome. Bit-identical for identical
/// genomes — species identity is tracked by genome equality, so colors must
/// never wobble between decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}
