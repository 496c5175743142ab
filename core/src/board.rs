use alloc::vec::Vec;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - NotInitialized -> Initialized -> Playing, on the first poke or flag
/// - Playing <-> Paused
/// - Playing -> Completed
/// - Playing -> GameOver
/// - any -> Error
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// No mines placed yet
    #[default]
    NotInitialized,
    /// Mines placed, first command not yet applied
    Initialized,
    Playing,
    Paused,
    /// Every safe cell is open
    Completed,
    /// A mine exploded
    GameOver,
    /// A command failed or the level was invalid, see [`Board::error`]
    Error,
    /// Presentation-only board, never produced by play
    Demo,
}

impl GameState {
    /// Indicates the game has ended and no moves can be made anymore
    pub const fn is_final(self) -> bool {
        use GameState::*;
        match self {
            NotInitialized => false,
            Initialized => false,
            Playing => false,
            Paused => false,
            Completed => true,
            GameOver => true,
            Error => true,
            Demo => true,
        }
    }
}

/// Snapshot of a game: every cell plus the game-level state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    state: GameState,
    level: Level,
    cell_states: CellStateCounts,
    error: Option<GameError>,
    version: u32,
}

impl Board {
    /// Fresh board with every cell new and no mines placed.
    pub fn new(level: Level) -> Self {
        let cells: Array2<Cell> = Array2::default(Self::shape(&level.grid));
        let cell_states = CellStateCounts::tally(&cells);
        Self {
            cells,
            state: GameState::NotInitialized,
            level,
            cell_states,
            error: None,
            version: 0,
        }
    }

    /// Board for a level that failed validation.
    pub fn rejected(level: Level, error: ValidationError) -> Self {
        let mut board = Self::new(level);
        board.state = GameState::Error;
        board.error = Some(error.into());
        board
    }

    /// Rebuilds a board from [`Board::to_packed`] output.
    pub fn from_packed(level: Level, state: GameState, packed: &[u16]) -> Result<Self> {
        let expected = usize::from(level.total_cells());
        if packed.len() != expected {
            return Err(DecodeError::LengthMismatch {
                expected,
                actual: packed.len(),
            }
            .into());
        }

        let cells = packed
            .iter()
            .enumerate()
            .map(|(index, &bits)| Cell::decode(bits).ok_or(DecodeError::InvalidCell { index, bits }))
            .collect::<core::result::Result<Vec<_>, _>>()?;
        let cells = Array2::from_shape_vec(Self::shape(&level.grid), cells).map_err(|_| {
            DecodeError::LengthMismatch {
                expected,
                actual: packed.len(),
            }
        })?;

        let cell_states = CellStateCounts::tally(&cells);
        Ok(Self {
            cells,
            state,
            level,
            cell_states,
            error: None,
            version: 0,
        })
    }

    /// Every cell packed with [`Cell::encode`], in index order.
    pub fn to_packed(&self) -> Vec<u16> {
        self.cells.iter().map(|cell| cell.encode()).collect()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_final(&self) -> bool {
        self.state.is_final()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn grid(&self) -> Grid {
        self.level.grid
    }

    pub fn cell(&self, coords: impl Into<Coordinate>) -> Option<Cell> {
        let index = self.level.grid.resolve(coords)?;
        Some(self.cell_at(index))
    }

    /// Cells in index order.
    pub fn cells(&self) -> impl Iterator<Item = (CellIndex, Cell)> + '_ {
        (0..).zip(self.cells.iter().copied())
    }

    pub fn cell_states(&self) -> CellStateCounts {
        self.cell_states
    }

    pub fn count(&self, state: CellState) -> CellCount {
        self.cell_states[state]
    }

    pub fn error(&self) -> Option<&GameError> {
        self.error.as_ref()
    }

    /// Incremented on every accepted mutation.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// How many mines have not been flagged yet
    pub fn mines_left(&self) -> isize {
        (self.level.mines as isize) - (self.count(CellState::Flagged) as isize)
    }

    pub(crate) fn cell_at(&self, index: CellIndex) -> Cell {
        self.cells[self.level.grid.row_col(index).to_nd_index()]
    }

    pub(crate) fn set_cell(&mut self, index: CellIndex, cell: Cell) {
        self.cells[self.level.grid.row_col(index).to_nd_index()] = cell;
    }

    pub(crate) fn set_cell_state(&mut self, index: CellIndex, state: CellState) {
        let cell = self.cell_at(index);
        self.set_cell(index, cell.with_state(state));
    }

    pub(crate) fn set_state(&mut self, state: GameState) {
        self.state = state;
    }

    /// Recounts cell states and marks a new version.
    pub(crate) fn commit(&mut self) {
        self.cell_states = CellStateCounts::tally(&self.cells);
        self.version = self.version.wrapping_add(1);
    }

    pub(crate) fn into_error(mut self, error: GameError) -> Self {
        self.state = GameState::Error;
        self.error = Some(error);
        self.commit();
        self
    }

    fn shape(grid: &Grid) -> (usize, usize) {
        (grid.rows.into(), grid.cols.into())
    }
}
