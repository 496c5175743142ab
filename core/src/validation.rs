use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::*;

/// Smallest accepted row or column count.
pub const MIN_LEVEL: Coord = 3;

/// Largest accepted row or column count.
pub const MAX_LEVEL: Coord = 30;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelField {
    Rows,
    Cols,
    Mines,
}

impl fmt::Display for LevelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rows => "rows",
            Self::Cols => "cols",
            Self::Mines => "mines",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    TooSmall,
    TooLarge,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TooSmall => "Too small",
            Self::TooLarge => "Too large",
        })
    }
}

/// A single out-of-range level parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub field: LevelField,
    pub value: CellCount,
    pub message: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}: {}", self.field, self.value, self.message)
    }
}

/// Accepted mine range for a grid: 10% of the cells rounded up to 50% rounded down.
pub const fn mine_bounds(grid: &Grid) -> (CellCount, CellCount) {
    let total = grid.total_cells();
    (total.div_ceil(10), total / 2)
}

/// Reports every out-of-range parameter of `level`, empty when the level is playable.
pub fn validate_level(level: &Level) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut check = |field, value: CellCount, (min, max): (CellCount, CellCount)| {
        let message = if value < min {
            ViolationKind::TooSmall
        } else if value > max {
            ViolationKind::TooLarge
        } else {
            return;
        };
        violations.push(Violation {
            field,
            value,
            message,
        });
    };

    let axis = (CellCount::from(MIN_LEVEL), CellCount::from(MAX_LEVEL));
    check(LevelField::Rows, level.grid.rows.into(), axis);
    check(LevelField::Cols, level.grid.cols.into(), axis);
    check(LevelField::Mines, level.mines, mine_bounds(&level.grid));

    violations
}

/// [`validate_level`] folded into a [`ValidationError`].
pub fn check_level(level: &Level) -> core::result::Result<(), ValidationError> {
    let violations = validate_level(level);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}
