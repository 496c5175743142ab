//! Deterministic Minesweeper engine over square or hex grids with clipped or wrapping edges,
//! plus a Game of Life automaton sharing the same neighbor function.
//!
//! The engine is a state machine from `(command, coordinate, board)` to a new [`Board`];
//! boards are plain values and are never mutated in place.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use life::*;
pub use topology::*;
pub use types::*;
pub use validation::*;

mod board;
mod cell;
mod engine;
mod error;
mod generator;
mod life;
mod topology;
mod types;
mod validation;

/// Grid shape plus the number of mines to place on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level {
    #[serde(flatten)]
    pub grid: Grid,
    pub mines: CellCount,
}

impl Level {
    pub const fn new(grid: Grid, mines: CellCount) -> Self {
        Self { grid, mines }
    }

    pub const fn beginner() -> Self {
        Self::new(Grid::new(9, 9), 10)
    }

    pub const fn intermediate() -> Self {
        Self::new(Grid::new(16, 16), 40)
    }

    pub const fn expert() -> Self {
        Self::new(Grid::new(16, 30), 99)
    }

    pub const fn total_cells(&self) -> CellCount {
        self.grid.total_cells()
    }

    pub const fn safe_cell_count(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::beginner()
    }
}
