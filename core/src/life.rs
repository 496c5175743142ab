use alloc::sync::Arc;
use ndarray::Array2;

use crate::*;

/// Conway's Game of Life over any [`Grid`], using the same neighbor function as the minefield.
#[derive(Clone, Debug, PartialEq)]
pub struct LifeBoard {
    cells: Array2<bool>,
    generation: u32,
    neighbors: Arc<NeighborTable>,
}

impl LifeBoard {
    pub fn new(grid: Grid) -> Self {
        Self {
            cells: Array2::default((usize::from(grid.rows), usize::from(grid.cols))),
            generation: 0,
            neighbors: Arc::new(grid.neighbor_table()),
        }
    }

    /// Board with the given cells alive; coordinates outside the grid are ignored.
    pub fn from_cells(grid: Grid, alive: impl IntoIterator<Item = impl Into<Coordinate>>) -> Self {
        let mut board = Self::new(grid);
        for coords in alive {
            board.set_alive(coords, true);
        }
        board
    }

    /// Reads a plain-text pattern with its top-left corner at `origin`.
    ///
    /// `O`, `#` and `*` are alive, anything else is dead. Cells past the grid edge are dropped.
    pub fn from_pattern(grid: Grid, origin: RowCol, pattern: &str) -> Self {
        let alive = pattern.lines().enumerate().flat_map(|(dr, line)| {
            line.chars()
                .enumerate()
                .filter(|(_, ch)| matches!(ch, 'O' | '#' | '*'))
                .filter_map(move |(dc, _)| {
                    let row = usize::from(origin.row) + dr;
                    let col = usize::from(origin.col) + dc;
                    Some(RowCol::new(row.try_into().ok()?, col.try_into().ok()?))
                })
        });
        Self::from_cells(grid, alive)
    }

    pub fn grid(&self) -> Grid {
        self.neighbors.grid()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    pub fn is_alive(&self, coords: impl Into<Coordinate>) -> bool {
        self.grid()
            .resolve(coords)
            .is_some_and(|index| self.alive_at(index))
    }

    pub fn set_alive(&mut self, coords: impl Into<Coordinate>, alive: bool) {
        let grid = self.grid();
        if let Some(index) = grid.resolve(coords) {
            self.cells[grid.row_col(index).to_nd_index()] = alive;
        }
    }

    /// Live cells in index order.
    pub fn alive(&self) -> impl Iterator<Item = CellIndex> + '_ {
        (0..).zip(self.cells.iter()).filter_map(|(index, &alive)| alive.then_some(index))
    }

    pub fn live_neighbors(&self, index: CellIndex) -> usize {
        self.neighbors
            .get(index)
            .iter()
            .filter(|&&neighbor| self.alive_at(neighbor))
            .count()
    }

    /// Next generation: survival on 2 or 3 live neighbors, birth on exactly 3.
    pub fn step(&self) -> Self {
        let grid = self.grid();
        let mut cells = self.cells.clone();
        for index in 0..grid.total_cells() {
            let alive = matches!(
                (self.alive_at(index), self.live_neighbors(index)),
                (true, 2 | 3) | (false, 3)
            );
            cells[grid.row_col(index).to_nd_index()] = alive;
        }
        log::trace!("Life generation {}", self.generation + 1);

        Self {
            cells,
            generation: self.generation + 1,
            neighbors: self.neighbors.clone(),
        }
    }

    fn alive_at(&self, index: CellIndex) -> bool {
        self.cells[self.grid().row_col(index).to_nd_index()]
    }
}
