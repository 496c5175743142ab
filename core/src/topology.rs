use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Tessellation of the grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridShape {
    #[default]
    Square,
    /// Pointy-top hexagons in offset coordinates, odd rows shifted right.
    Hex,
}

/// Edge behavior of the grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    /// Neighbors past an edge are dropped.
    #[default]
    Limited,
    /// Neighbors past an edge wrap to the opposite side.
    Toroidal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    pub rows: Coord,
    pub cols: Coord,
    pub shape: GridShape,
    pub topology: Topology,
}

/// Neighbor indices of a single cell, in enumeration order.
pub type Neighbors = SmallVec<[CellIndex; 8]>;

/// `(row, col)` displacements, row by row.
const SQUARE_DISPLACEMENTS: [(i16, i16); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const HEX_EVEN_ROW_DISPLACEMENTS: [(i16, i16); 6] = [
    (-1, -1),
    (-1, 0),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
];

const HEX_ODD_ROW_DISPLACEMENTS: [(i16, i16); 6] = [
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, 0),
    (1, 1),
];

impl Grid {
    /// Square grid with clipped edges.
    pub const fn new(rows: Coord, cols: Coord) -> Self {
        Self {
            rows,
            cols,
            shape: GridShape::Square,
            topology: Topology::Limited,
        }
    }

    pub const fn with_shape(self, shape: GridShape) -> Self {
        Self { shape, ..self }
    }

    pub const fn with_topology(self, topology: Topology) -> Self {
        Self { topology, ..self }
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }

    pub fn contains(&self, RowCol { row, col }: RowCol) -> bool {
        row < self.rows && col < self.cols
    }

    /// Validates `coords` against the grid bounds and converts it to a linear index.
    pub fn resolve(&self, coords: impl Into<Coordinate>) -> Option<CellIndex> {
        match coords.into() {
            Coordinate::Index(index) => (index < self.total_cells()).then_some(index),
            Coordinate::RowCol(rc) => self.contains(rc).then(|| to_index(self.cols, rc)),
        }
    }

    pub const fn row_col(&self, index: CellIndex) -> RowCol {
        to_row_col(self.cols, index)
    }

    /// Neighbors of `origin`, never including `origin` itself and never repeating an index.
    ///
    /// Returns an empty set when `origin` is outside the grid.
    pub fn neighbors(&self, origin: impl Into<Coordinate>) -> Neighbors {
        let mut neighbors = Neighbors::new();
        let Some(origin_index) = self.resolve(origin) else {
            return neighbors;
        };
        let origin = self.row_col(origin_index);

        for &delta in self.displacements(origin.row) {
            let Some(rc) = self.apply_delta(origin, delta) else {
                continue;
            };
            let index = to_index(self.cols, rc);
            // small toroidal grids can wrap back onto the origin or onto an earlier neighbor
            if index != origin_index && !neighbors.contains(&index) {
                neighbors.push(index);
            }
        }

        neighbors
    }

    pub fn neighbor_table(&self) -> NeighborTable {
        NeighborTable::new(*self)
    }

    fn displacements(&self, row: Coord) -> &'static [(i16, i16)] {
        match (self.shape, row % 2) {
            (GridShape::Square, _) => &SQUARE_DISPLACEMENTS,
            (GridShape::Hex, 0) => &HEX_EVEN_ROW_DISPLACEMENTS,
            (GridShape::Hex, _) => &HEX_ODD_ROW_DISPLACEMENTS,
        }
    }

    /// Applies `delta` to `origin`, clipping or wrapping according to the topology.
    fn apply_delta(&self, origin: RowCol, (dr, dc): (i16, i16)) -> Option<RowCol> {
        let row = i16::from(origin.row) + dr;
        let col = i16::from(origin.col) + dc;
        let rows = i16::from(self.rows);
        let cols = i16::from(self.cols);

        let (row, col) = match self.topology {
            Topology::Limited => {
                if !(0..rows).contains(&row) || !(0..cols).contains(&col) {
                    return None;
                }
                (row, col)
            }
            Topology::Toroidal => (row.rem_euclid(rows), col.rem_euclid(cols)),
        };

        Some(RowCol::new(row.try_into().ok()?, col.try_into().ok()?))
    }
}

/// Precomputed neighbor sets for every cell of one grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborTable {
    grid: Grid,
    neighbors: Vec<Neighbors>,
}

impl NeighborTable {
    pub fn new(grid: Grid) -> Self {
        let neighbors = (0..grid.total_cells())
            .map(|index| grid.neighbors(index))
            .collect();
        log::debug!(
            "Built neighbor table for {}x{} {:?}/{:?}",
            grid.rows,
            grid.cols,
            grid.shape,
            grid.topology
        );
        Self { grid, neighbors }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Neighbors of `index`, empty when `index` is outside the grid.
    pub fn get(&self, index: CellIndex) -> &[CellIndex] {
        self.neighbors
            .get(usize::from(index))
            .map_or(&[], |neighbors| neighbors.as_slice())
    }
}
