//! Broad phase: an unbounded uniform grid hashing bodies by position.
//!
//! Dynamic bodies are bucketed by the cell holding their tentative centre.
//! Static bodies are kept in a separate list and handed out with every
//! neighbour query, since scenery tends to be large and few.

use hashbrown::{HashMap, HashSet};

use crate::body::RigidBody;
use crate::math::Vec3;

/// Integer coordinate of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CellCoord {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// This cell and its 26 neighbours, in a fixed order.
    pub fn neighborhood(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).map(move |dz| CellCoord::new(self.x + dx, self.y + dy, self.z + dz))
            })
        })
    }
}

/// Spatial hash over body indices.
///
/// Indices refer to the caller's body slice and are only meaningful until
/// the grid is rebuilt.
#[derive(Debug, Clone)]
pub struct SpatialHashGrid {
    cell_size: f64,
    cells: HashMap<CellCoord, Vec<usize>>,
    statics: Vec<usize>,
}

impl SpatialHashGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            statics: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell holding `position`: `floor(p / s)` per axis.
    pub fn cell_of(&self, position: &Vec3) -> CellCoord {
        CellCoord::new(
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
            (position.z / self.cell_size).floor() as i64,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.statics.clear();
    }

    /// Registers body `index`, keyed on its tentative position.
    pub fn insert(&mut self, index: usize, body: &RigidBody) {
        if body.is_static() {
            self.statics.push(index);
            return;
        }
        let cell = self.cell_of(&body.next().position);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Clears the grid and inserts every body of `bodies`.
    pub fn rebuild(&mut self, bodies: &[RigidBody]) {
        self.clear();
        for (index, body) in bodies.iter().enumerate() {
            self.insert(index, body);
        }
    }

    /// Candidates near `body`: everything in the 27 surrounding cells plus
    /// every static body, without duplicates, in a deterministic order.
    ///
    /// The result may contain the queried body itself.
    pub fn neighbors(&self, body: &RigidBody) -> Vec<usize> {
        let center = self.cell_of(&body.next().position);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let bucketed = center
            .neighborhood()
            .filter_map(|cell| self.cells.get(&cell))
            .flatten();
        for &index in bucketed.chain(self.statics.iter()) {
            if seen.insert(index) {
                out.push(index);
            }
        }
        out
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
