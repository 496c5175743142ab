use serde::{Deserialize, Serialize};

/// Single coordinate axis used for grid rows, columns, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Linear cell index, `col + cols * row`.
pub type CellIndex = CellCount;

/// Two-dimensional position on a grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowCol {
    pub row: Coord,
    pub col: Coord,
}

impl RowCol {
    pub const fn new(row: Coord, col: Coord) -> Self {
        Self { row, col }
    }
}

impl From<(Coord, Coord)> for RowCol {
    fn from((row, col): (Coord, Coord)) -> Self {
        Self { row, col }
    }
}

pub const fn to_row_col(cols: Coord, index: CellIndex) -> RowCol {
    let cols = cols as CellIndex;
    RowCol {
        row: (index / cols) as Coord,
        col: (index % cols) as Coord,
    }
}

pub const fn to_index(cols: Coord, rc: RowCol) -> CellIndex {
    rc.col as CellIndex + mult(cols, rc.row)
}

/// Either form of cell address. Every board-facing API accepts `impl Into<Coordinate>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coordinate {
    Index(CellIndex),
    RowCol(RowCol),
}

impl Coordinate {
    pub const fn index(self, cols: Coord) -> CellIndex {
        match self {
            Self::Index(index) => index,
            Self::RowCol(rc) => to_index(cols, rc),
        }
    }

    pub const fn row_col(self, cols: Coord) -> RowCol {
        match self {
            Self::Index(index) => to_row_col(cols, index),
            Self::RowCol(rc) => rc,
        }
    }
}

impl From<CellIndex> for Coordinate {
    fn from(index: CellIndex) -> Self {
        Self::Index(index)
    }
}

impl From<RowCol> for Coordinate {
    fn from(rc: RowCol) -> Self {
        Self::RowCol(rc)
    }
}

impl From<(Coord, Coord)> for Coordinate {
    fn from(rc: (Coord, Coord)) -> Self {
        Self::RowCol(rc.into())
    }
}

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for RowCol {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.row.into(), self.col.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}
