use alloc::vec::Vec;
use hashbrown::HashSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::*;

/// Indices of mined cells.
pub type MineSet = HashSet<CellIndex>;

/// Chooses where the mines go once the first cell of a game is known.
pub trait MineGenerator {
    /// Returns exactly `level.mines` indices, none of them `start`.
    fn generate(
        &mut self,
        level: &Level,
        start: CellIndex,
    ) -> core::result::Result<MineSet, InvariantError>;
}

/// Uniform sampling over every cell except the start cell.
///
/// Sampling gives up after `mines * 10` draws so an impossible density cannot spin forever.
#[derive(Clone, Debug)]
pub struct RandomMineGenerator {
    rng: ChaCha8Rng,
}

impl RandomMineGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl MineGenerator for RandomMineGenerator {
    fn generate(
        &mut self,
        level: &Level,
        start: CellIndex,
    ) -> core::result::Result<MineSet, InvariantError> {
        let total_cells = level.total_cells();
        let wanted = usize::from(level.mines);
        let max_attempts = u32::from(level.mines) * 10;

        let mut mines = MineSet::with_capacity(wanted);
        let mut attempts = 0;
        while mines.len() < wanted {
            if attempts >= max_attempts {
                log::warn!(
                    "Mine sampling stopped at {} of {} mines",
                    mines.len(),
                    wanted
                );
                return Err(InvariantError::RunawayMineSampling { attempts });
            }
            attempts += 1;

            let index = self.rng.gen_range(0..total_cells);
            if index != start {
                mines.insert(index);
            }
        }

        log::debug!("Placed {} mines in {} draws", wanted, attempts);
        Ok(mines)
    }
}

/// Caller-chosen mine positions, for replays and reproducible boards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixedMineGenerator {
    mines: Vec<CellIndex>,
}

impl FixedMineGenerator {
    pub fn new(mines: impl IntoIterator<Item = impl Into<Coordinate>>, grid: &Grid) -> Self {
        let mines = mines
            .into_iter()
            .filter_map(|coords| grid.resolve(coords))
            .collect();
        Self { mines }
    }
}

impl MineGenerator for FixedMineGenerator {
    fn generate(
        &mut self,
        level: &Level,
        start: CellIndex,
    ) -> core::result::Result<MineSet, InvariantError> {
        let mines: MineSet = self
            .mines
            .iter()
            .copied()
            .filter(|&index| index != start)
            .collect();

        // a layout that mines the start cell loses that mine and fails the count check
        let actual: CellCount = mines.len().try_into().unwrap_or(CellCount::MAX);
        if actual != level.mines {
            return Err(InvariantError::MineCountMismatch {
                expected: level.mines,
                actual,
            });
        }

        Ok(mines)
    }
}
