use alloc::boxed::Box;
use alloc::collections::{BTreeSet, VecDeque};
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Reveal a cell, or chord an already open one
    Poke,
    /// Cycle new -> flagged -> uncertain -> new
    Flag,
    TogglePause,
}

/// Result of the game-over side effect; failures are logged and dropped.
pub type HookResult = core::result::Result<(), Box<dyn core::error::Error + Send + Sync>>;

pub type GameOverHook = Box<dyn FnMut(&Board) -> HookResult>;

/// Transition function for one level.
///
/// Holds the neighbor table, the mine generator and the game-over hook; all game state lives
/// in the [`Board`] values passed through [`Game::next_state`].
pub struct Game {
    neighbors: NeighborTable,
    level: Level,
    generator: Box<dyn MineGenerator>,
    on_game_over: Option<GameOverHook>,
    rejected: Option<Board>,
}

/// Validates `level` and returns its starting board with a randomly mined game.
///
/// An invalid level yields an error board and a game that returns that board for every command.
pub fn create_game(
    level: Level,
    seed: u64,
    on_game_over: impl FnMut(&Board) -> HookResult + 'static,
) -> (Board, Game) {
    let game = Game::new(level, RandomMineGenerator::new(seed)).with_game_over_hook(on_game_over);
    (game.initial_board(), game)
}

impl Game {
    pub fn new(level: Level, generator: impl MineGenerator + 'static) -> Self {
        let rejected = check_level(&level).err().map(|error| {
            log::warn!("Rejected level {:?}: {}", level, error);
            Board::rejected(level, error)
        });
        Self {
            neighbors: level.grid.neighbor_table(),
            level,
            generator: Box::new(generator),
            on_game_over: None,
            rejected,
        }
    }

    pub fn with_game_over_hook(
        mut self,
        on_game_over: impl FnMut(&Board) -> HookResult + 'static,
    ) -> Self {
        self.on_game_over = Some(Box::new(on_game_over));
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn initial_board(&self) -> Board {
        match &self.rejected {
            Some(board) => board.clone(),
            None => Board::new(self.level),
        }
    }

    /// Applies `command` at `coords` to `board` and returns the resulting board.
    ///
    /// Never fails: rejected commands return an equal board, and internal failures return
    /// `board` in [`GameState::Error`] with the failing command recorded.
    pub fn next_state(
        &mut self,
        command: Command,
        coords: impl Into<Coordinate>,
        board: &Board,
    ) -> Board {
        if let Some(rejected) = &self.rejected {
            return rejected.clone();
        }

        let coords = coords.into();
        match self.apply(command, coords, board) {
            Ok(next) => {
                if next.state() == GameState::GameOver && board.state() != GameState::GameOver {
                    self.notify_game_over(&next);
                }
                next
            }
            Err(cause) => {
                log::error!("{:?} at {:?} failed: {}", command, coords, cause);
                board
                    .clone()
                    .into_error(GameError::Command { command, cause })
            }
        }
    }

    pub fn poke(&mut self, coords: impl Into<Coordinate>, board: &Board) -> Board {
        self.next_state(Command::Poke, coords, board)
    }

    pub fn flag(&mut self, coords: impl Into<Coordinate>, board: &Board) -> Board {
        self.next_state(Command::Flag, coords, board)
    }

    pub fn toggle_pause(&mut self, board: &Board) -> Board {
        self.next_state(Command::TogglePause, Coordinate::Index(0), board)
    }

    fn apply(
        &mut self,
        command: Command,
        coords: Coordinate,
        board: &Board,
    ) -> core::result::Result<Board, InvariantError> {
        use Command::*;
        use GameState::*;

        match (board.state(), command) {
            (Completed | GameOver | Error | Demo, _) => Ok(board.clone()),
            (NotInitialized | Initialized, TogglePause) => Ok(board.clone()),
            (Paused, Poke | Flag) => Ok(board.clone()),
            (Playing, TogglePause) => Ok(Self::with_state(board, Paused)),
            (Paused, TogglePause) => Ok(Self::with_state(board, Playing)),
            (NotInitialized, Poke | Flag) => {
                let start = self.resolve(coords, board)?;
                let initialized = self.initialize(board, start)?;
                self.apply(command, coords, &initialized)
            }
            (Initialized, Poke | Flag) => {
                let mut playing = board.clone();
                playing.set_state(Playing);
                self.apply(command, coords, &playing)
            }
            (Playing, Poke) => {
                let index = self.resolve(coords, board)?;
                self.poke_cell(board, index)
            }
            (Playing, Flag) => {
                let index = self.resolve(coords, board)?;
                Ok(Self::flag_cell(board, index))
            }
        }
    }

    fn resolve(
        &self,
        coords: Coordinate,
        board: &Board,
    ) -> core::result::Result<CellIndex, InvariantError> {
        if board.grid() != self.neighbors.grid() {
            return Err(InvariantError::GridMismatch);
        }
        board
            .grid()
            .resolve(coords)
            .ok_or(InvariantError::InvalidCoords)
    }

    /// Places the mines around `start` and fills in every threat value.
    fn initialize(
        &mut self,
        board: &Board,
        start: CellIndex,
    ) -> core::result::Result<Board, InvariantError> {
        let mines = self.generator.generate(&board.level(), start)?;

        let mut next = board.clone();
        for index in 0..board.level().total_cells() {
            let threat_value = if mines.contains(&index) {
                MINE
            } else {
                self.neighbors
                    .get(index)
                    .iter()
                    .filter(|neighbor| mines.contains(*neighbor))
                    .count() as u8
            };
            let state = board.cell_at(index).state;
            next.set_cell(index, Cell::new(state, threat_value));
        }

        next.set_state(GameState::Initialized);
        next.commit();
        log::debug!(
            "Initialized {} mines, start at {:?}",
            mines.len(),
            board.grid().row_col(start)
        );
        Ok(next)
    }

    fn poke_cell(
        &self,
        board: &Board,
        index: CellIndex,
    ) -> core::result::Result<Board, InvariantError> {
        use CellState::*;

        let mut next = board.clone();
        match board.cell_at(index).state {
            New | Uncertain => self.reveal(&mut next, index)?,
            Open => {
                if !self.chord(&mut next, index)? {
                    return Ok(board.clone());
                }
            }
            Flagged | Exploded => return Ok(board.clone()),
        }
        next.commit();

        let level = board.level();
        if next.count(Exploded) > board.count(Exploded) {
            log::debug!("Game over at {:?}", level.grid.row_col(index));
            next.set_state(GameState::GameOver);
        } else if u32::from(level.mines) + u32::from(next.count(Open))
            == u32::from(level.total_cells())
        {
            log::debug!("Completed, last poke at {:?}", level.grid.row_col(index));
            next.set_state(GameState::Completed);
        }
        Ok(next)
    }

    /// Opens or explodes a single unopened cell, flooding out from zero-threat cells.
    fn reveal(&self, board: &mut Board, index: CellIndex) -> core::result::Result<(), InvariantError> {
        match board.cell_at(index).threat(index)? {
            Threat::Mine => {
                board.set_cell_state(index, CellState::Exploded);
            }
            Threat::Count(count) => {
                board.set_cell_state(index, CellState::Open);
                log::debug!("Open cell at {}, threat: {}", index, count);
                if count == 0 {
                    self.flood_fill(board, index)?;
                }
            }
        }
        Ok(())
    }

    fn flood_fill(&self, board: &mut Board, origin: CellIndex) -> core::result::Result<(), InvariantError> {
        let mut visited = BTreeSet::from([origin]);
        let mut to_visit: VecDeque<CellIndex> = self
            .neighbors
            .get(origin)
            .iter()
            .copied()
            .filter(|&index| board.cell_at(index).state.is_unopened())
            .collect();
        log::trace!("Starting flood-fill from {}, initial neighbors: {:?}", origin, to_visit);

        while let Some(index) = to_visit.pop_front() {
            if !visited.insert(index) {
                continue;
            }

            // skip flagged or already opened cells
            let cell = board.cell_at(index);
            if !cell.state.is_unopened() {
                continue;
            }

            let count = match cell.threat(index)? {
                Threat::Mine => return Err(InvariantError::FloodReachedMine { index }),
                Threat::Count(count) => count,
            };
            board.set_cell_state(index, CellState::Open);
            log::trace!("Flood opened cell at {}, threat: {}", index, count);

            if count == 0 {
                to_visit.extend(
                    self.neighbors
                        .get(index)
                        .iter()
                        .copied()
                        .filter(|&neighbor| board.cell_at(neighbor).state.is_unopened())
                        .filter(|neighbor| !visited.contains(neighbor)),
                );
            }
        }
        Ok(())
    }

    /// Reveals every unopened neighbor once enough of them are flagged or exploded.
    ///
    /// Returns whether anything was revealed.
    fn chord(&self, board: &mut Board, index: CellIndex) -> core::result::Result<bool, InvariantError> {
        let Threat::Count(count) = board.cell_at(index).threat(index)? else {
            return Ok(false);
        };

        let neighbors = self.neighbors.get(index);
        let marked = neighbors
            .iter()
            .filter(|&&neighbor| {
                matches!(
                    board.cell_at(neighbor).state,
                    CellState::Flagged | CellState::Exploded
                )
            })
            .count();
        if marked < usize::from(count) {
            log::trace!("Chord at {} not ready, {} of {} marked", index, marked, count);
            return Ok(false);
        }

        let mut revealed = false;
        for &neighbor in neighbors {
            // an earlier flood in this chord may already have opened it
            if board.cell_at(neighbor).state.is_unopened() {
                self.reveal(board, neighbor)?;
                revealed = true;
            }
        }
        Ok(revealed)
    }

    fn flag_cell(board: &Board, index: CellIndex) -> Board {
        use CellState::*;

        let state = match board.cell_at(index).state {
            New => Flagged,
            Flagged => Uncertain,
            Uncertain => New,
            Open | Exploded => return board.clone(),
        };
        let mut next = board.clone();
        next.set_cell_state(index, state);
        next.commit();
        next
    }

    fn with_state(board: &Board, state: GameState) -> Board {
        let mut next = board.clone();
        next.set_state(state);
        next.commit();
        next
    }

    fn notify_game_over(&mut self, board: &Board) {
        let Some(hook) = self.on_game_over.as_mut() else {
            return;
        };
        if let Err(err) = hook(board) {
            log::warn!("Game over hook failed: {}", err);
        }
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("level", &self.level)
            .field("has_game_over_hook", &self.on_game_over.is_some())
            .field("rejected", &self.rejected.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fixed_game(level: Level, mines: &[(Coord, Coord)]) -> (Game, Board) {
        let game = Game::new(level, FixedMineGenerator::new(mines.iter().copied(), &level.grid));
        let board = game.initial_board();
        (game, board)
    }

    fn counting_hook(game: Game) -> (Game, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let game = game.with_game_over_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (game, calls)
    }

    /// 5x5 with a mined middle column at rows 0, 2 and 4.
    fn wall_level() -> (Level, [(Coord, Coord); 3]) {
        (Level::new(Grid::new(5, 5), 3), [(0, 2), (2, 2), (4, 2)])
    }

    fn assert_threats_consistent(board: &Board) {
        let grid = board.grid();
        let mines = board.cells().filter(|(_, cell)| cell.is_mine()).count();
        assert_eq!(mines, usize::from(board.level().mines));

        for (index, cell) in board.cells().filter(|(_, cell)| !cell.is_mine()) {
            let expected = grid
                .neighbors(index)
                .iter()
                .filter(|&&neighbor| board.cell(neighbor).unwrap().is_mine())
                .count();
            assert_eq!(usize::from(cell.threat_value), expected, "index {index}");
        }
    }

    #[test]
    fn first_poke_is_never_a_mine() {
        for seed in 0..30 {
            let (board, mut game) = create_game(Level::beginner(), seed, |_| Ok(()));

            let board = game.poke((4u8, 4u8), &board);

            assert!(!board.cell((4u8, 4u8)).unwrap().is_mine());
            assert_eq!(board.cell((4u8, 4u8)).unwrap().state, CellState::Open);
            assert!(matches!(
                board.state(),
                GameState::Playing | GameState::Completed
            ));
            assert_threats_consistent(&board);
        }
    }

    #[test]
    fn threats_follow_hex_toroidal_neighbors() {
        let level = Level::new(
            Grid::new(8, 8)
                .with_shape(GridShape::Hex)
                .with_topology(Topology::Toroidal),
            12,
        );
        let (board, mut game) = create_game(level, 3, |_| Ok(()));

        let board = game.flag(10u16, &board);

        assert_eq!(board.state(), GameState::Playing);
        assert_eq!(board.cell(10u16).unwrap().state, CellState::Flagged);
        assert!(board.cells().all(|(_, cell)| cell.threat_value <= 6 || cell.is_mine()));
        assert_threats_consistent(&board);
    }

    #[test]
    fn same_seed_same_game() {
        let (a, mut game_a) = create_game(Level::intermediate(), 99, |_| Ok(()));
        let (b, mut game_b) = create_game(Level::intermediate(), 99, |_| Ok(()));

        assert_eq!(game_a.poke(100u16, &a), game_b.poke(100u16, &b));
    }

    #[test]
    fn flood_fill_opens_zero_region_and_its_border() {
        let (level, mines) = wall_level();
        let (mut game, board) = fixed_game(level, &mines);

        let board = game.poke((2u8, 0u8), &board);

        assert_eq!(board.state(), GameState::Playing);
        assert_eq!(board.count(CellState::Open), 10);
        for (index, cell) in board.cells() {
            let expected = if level.grid.row_col(index).col < 2 {
                CellState::Open
            } else {
                CellState::New
            };
            assert_eq!(cell.state, expected, "index {index}");
        }
        assert_eq!(board.cell((1u8, 1u8)).unwrap().threat_value, 2);
        assert_eq!(board.cell((2u8, 1u8)).unwrap().threat_value, 1);
    }

    #[test]
    fn flood_fill_leaves_flags_alone() {
        let (level, mines) = wall_level();
        let (mut game, board) = fixed_game(level, &mines);

        let board = game.flag((4u8, 0u8), &board);
        assert_eq!(board.state(), GameState::Playing);
        let board = game.poke((0u8, 0u8), &board);

        assert_eq!(board.cell((4u8, 0u8)).unwrap().state, CellState::Flagged);
        assert_eq!(board.count(CellState::Open), 9);
        assert_eq!(board.mines_left(), 2);
    }

    #[test]
    fn chord_waits_for_enough_flags() {
        let (level, mines) = wall_level();
        let (mut game, board) = fixed_game(level, &mines);
        let board = game.poke((2u8, 0u8), &board);
        let board = game.flag((0u8, 2u8), &board);

        let chorded = game.poke((1u8, 1u8), &board);
        assert_eq!(chorded, board);

        let board = game.flag((2u8, 2u8), &board);
        let chorded = game.poke((1u8, 1u8), &board);

        assert_eq!(chorded.state(), GameState::Playing);
        assert_eq!(chorded.cell((1u8, 2u8)).unwrap().state, CellState::Open);
        assert_eq!(chorded.count(CellState::Open), 11);
        assert_eq!(chorded.version(), board.version() + 1);
    }

    #[test]
    fn chord_with_wrong_flag_explodes() {
        let (level, mines) = wall_level();
        let (game, board) = fixed_game(level, &mines);
        let (mut game, calls) = counting_hook(game);
        let board = game.poke((2u8, 0u8), &board);
        let board = game.flag((3u8, 2u8), &board);
        let board = game.flag((2u8, 2u8), &board);

        let board = game.poke((3u8, 1u8), &board);

        assert_eq!(board.state(), GameState::GameOver);
        assert_eq!(board.cell((4u8, 2u8)).unwrap().state, CellState::Exploded);
        assert_eq!(board.count(CellState::Exploded), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn poking_a_mine_ends_the_game_once() {
        let (level, mines) = wall_level();
        let (game, board) = fixed_game(level, &mines);
        let (mut game, calls) = counting_hook(game);
        let board = game.poke((2u8, 0u8), &board);

        let lost = game.poke((2u8, 2u8), &board);

        assert_eq!(lost.state(), GameState::GameOver);
        assert_eq!(lost.cell((2u8, 2u8)).unwrap().state, CellState::Exploded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(game.poke((0u8, 2u8), &lost), lost);
        assert_eq!(game.flag((0u8, 4u8), &lost), lost);
        assert_eq!(game.toggle_pause(&lost), lost);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_hook_does_not_corrupt_the_board() {
        let (level, mines) = wall_level();
        let (game, board) = fixed_game(level, &mines);
        let mut game = game.with_game_over_hook(|_| Err("haptics unavailable".into()));
        let board = game.poke((2u8, 0u8), &board);

        let lost = game.poke((0u8, 2u8), &board);

        assert_eq!(lost.state(), GameState::GameOver);
        assert!(lost.error().is_none());
    }

    #[test]
    fn opening_every_safe_cell_completes() {
        let level = Level::new(Grid::new(3, 3), 1);
        let (mut game, mut board) = fixed_game(level, &[(1, 1)]);

        for index in [0u16, 1, 2, 3, 5, 6, 7] {
            board = game.poke(index, &board);
            assert_eq!(board.state(), GameState::Playing);
        }
        board = game.poke(8u16, &board);

        assert_eq!(board.state(), GameState::Completed);
        assert_eq!(board.count(CellState::Open), 8);
        assert_eq!(board.cell(4u16).unwrap().state, CellState::New);
    }

    #[test]
    fn single_flood_can_complete() {
        let level = Level::new(Grid::new(3, 3), 1);
        let (mut game, board) = fixed_game(level, &[(0, 0)]);

        let board = game.poke((2u8, 2u8), &board);

        assert_eq!(board.state(), GameState::Completed);
        assert_eq!(board.count(CellState::Open), 8);
    }

    #[test]
    fn flag_cycles_through_three_states() {
        let (level, mines) = wall_level();
        let (mut game, board) = fixed_game(level, &mines);
        let board = game.poke((2u8, 0u8), &board);
        let target = (0u8, 4u8);

        let flagged = game.flag(target, &board);
        assert_eq!(flagged.cell(target).unwrap().state, CellState::Flagged);
        assert_eq!(flagged.mines_left(), 2);

        let uncertain = game.flag(target, &flagged);
        assert_eq!(uncertain.cell(target).unwrap().state, CellState::Uncertain);
        assert_eq!(uncertain.mines_left(), 3);

        let cleared = game.flag(target, &uncertain);
        assert_eq!(cleared.cell(target).unwrap().state, CellState::New);
        assert_eq!(cleared.cell_states(), board.cell_states());
        assert_eq!(cleared.version(), board.version() + 3);

        assert_eq!(game.flag((2u8, 0u8), &board), board);
    }

    #[test]
    fn poke_respects_flags_but_not_question_marks() {
        let (level, mines) = wall_level();
        let (mut game, board) = fixed_game(level, &mines);
        let board = game.poke((2u8, 0u8), &board);

        let flagged = game.flag((0u8, 3u8), &board);
        assert_eq!(game.poke((0u8, 3u8), &flagged), flagged);

        let uncertain = game.flag((0u8, 3u8), &flagged);
        let opened = game.poke((0u8, 3u8), &uncertain);
        assert_eq!(opened.cell((0u8, 3u8)).unwrap().state, CellState::Open);
    }

    #[test]
    fn pause_blocks_play_until_resumed() {
        let (level, mines) = wall_level();
        let (mut game, board) = fixed_game(level, &mines);

        assert_eq!(game.toggle_pause(&board), board);

        let board = game.poke((2u8, 0u8), &board);
        let paused = game.toggle_pause(&board);
        assert_eq!(paused.state(), GameState::Paused);
        assert_eq!(game.poke((0u8, 4u8), &paused), paused);
        assert_eq!(game.flag((0u8, 4u8), &paused), paused);

        let resumed = game.toggle_pause(&paused);
        assert_eq!(resumed.state(), GameState::Playing);
        assert_eq!(resumed.to_packed(), board.to_packed());
    }

    #[test]
    fn invalid_level_yields_inert_error_board() {
        let level = Level::new(Grid::new(2, 2), 1);
        let (board, mut game) = create_game(level, 0, |_| Ok(()));

        assert_eq!(board.state(), GameState::Error);
        let Some(GameError::Validation(error)) = board.error() else {
            panic!("expected a validation error, got {:?}", board.error());
        };
        assert_eq!(error.violations.len(), 2);

        assert_eq!(game.poke(0u16, &board), board);
        assert_eq!(game.toggle_pause(&Board::new(level)), board);
    }

    #[test]
    fn out_of_range_threat_is_contained() {
        let (level, mines) = wall_level();
        let (mut game, board) = fixed_game(level, &mines);
        let board = game.poke((2u8, 0u8), &board);
        let mut packed = board.to_packed();
        packed[4] = Cell::new(CellState::New, 9).encode();
        let corrupted = Board::from_packed(level, GameState::Playing, &packed).unwrap();

        let failed = game.poke(4u16, &corrupted);

        assert_eq!(failed.state(), GameState::Error);
        let error = failed.error().unwrap();
        assert_eq!(
            error,
            &GameError::Command {
                command: Command::Poke,
                cause: InvariantError::ThreatOutOfRange { index: 4, value: 9 },
            }
        );
        assert_eq!(error.to_string(), "Command Poke failed");
        assert_eq!(
            error.source().unwrap().to_string(),
            "Threat value 9 at index 4 is out of range"
        );
        assert_eq!(game.poke(0u16, &failed), failed);
    }

    #[test]
    fn flood_into_a_mine_is_contained() {
        let level = Level::new(Grid::new(3, 3), 1);
        let mut packed = [Cell::default().encode(); 9];
        packed[0] = Cell::mine().encode();
        let board = Board::from_packed(level, GameState::Playing, &packed).unwrap();
        let mut game = Game::new(level, FixedMineGenerator::default());

        let failed = game.poke((2u8, 2u8), &board);

        assert_eq!(failed.state(), GameState::Error);
        assert_eq!(
            failed.error(),
            Some(&GameError::Command {
                command: Command::Poke,
                cause: InvariantError::FloodReachedMine { index: 0 },
            })
        );
    }

    #[test]
    fn out_of_range_coordinate_is_contained() {
        let (level, mines) = wall_level();
        let (mut game, board) = fixed_game(level, &mines);

        let failed = game.flag((5u8, 0u8), &board);

        assert_eq!(
            failed.error(),
            Some(&GameError::Command {
                command: Command::Flag,
                cause: InvariantError::InvalidCoords,
            })
        );
    }

    #[test]
    fn board_from_another_grid_is_contained() {
        let (level, mines) = wall_level();
        let (mut game, _) = fixed_game(level, &mines);

        let failed = game.poke(0u16, &Board::new(Level::beginner()));

        assert_eq!(failed.state(), GameState::Error);
        assert!(matches!(
            failed.error(),
            Some(GameError::Command {
                cause: InvariantError::GridMismatch,
                ..
            })
        ));
    }

    #[test]
    fn mined_start_cell_is_contained() {
        let level = Level::new(Grid::new(3, 3), 4);
        let (mut game, board) = fixed_game(level, &[(0, 0), (0, 1), (0, 2), (1, 0)]);

        let failed = game.poke((0u8, 0u8), &board);

        assert_eq!(
            failed.error(),
            Some(&GameError::Command {
                command: Command::Poke,
                cause: InvariantError::MineCountMismatch {
                    expected: 4,
                    actual: 3,
                },
            })
        );
    }
}
