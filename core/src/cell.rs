use core::ops::Index;
use serde::{Deserialize, Serialize};

use crate::*;

/// Threat value reserved for a cell that holds a mine.
pub const MINE: u8 = 0xFF;

/// Highest neighbor-mine count any tessellation can produce.
pub const MAX_THREAT: u8 = 8;

/// Player-visible state of a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    New,
    Open,
    Flagged,
    Uncertain,
    Exploded,
}

impl CellState {
    pub const ALL: [CellState; 5] = [
        CellState::New,
        CellState::Open,
        CellState::Flagged,
        CellState::Uncertain,
        CellState::Exploded,
    ];

    /// Whether a reveal can still act on the cell.
    pub const fn is_unopened(self) -> bool {
        matches!(self, Self::New | Self::Uncertain)
    }

    const fn tag(self) -> u16 {
        match self {
            Self::New => 0,
            Self::Open => 1,
            Self::Flagged => 2,
            Self::Uncertain => 3,
            Self::Exploded => 4,
        }
    }

    const fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Self::New),
            1 => Some(Self::Open),
            2 => Some(Self::Flagged),
            3 => Some(Self::Uncertain),
            4 => Some(Self::Exploded),
            _ => None,
        }
    }
}

/// Interpreted threat value of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Threat {
    Mine,
    Count(u8),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub state: CellState,
    /// Neighbor-mine count, or [`MINE`].
    pub threat_value: u8,
}

impl Cell {
    pub const fn new(state: CellState, threat_value: u8) -> Self {
        Self {
            state,
            threat_value,
        }
    }

    pub const fn mine() -> Self {
        Self::new(CellState::New, MINE)
    }

    pub const fn is_mine(self) -> bool {
        self.threat_value == MINE
    }

    pub const fn with_state(self, state: CellState) -> Self {
        Self { state, ..self }
    }

    /// Interprets the raw threat value, rejecting anything outside `0..=8` other than [`MINE`].
    pub fn threat(self, index: CellIndex) -> core::result::Result<Threat, InvariantError> {
        match self.threat_value {
            MINE => Ok(Threat::Mine),
            count if count <= MAX_THREAT => Ok(Threat::Count(count)),
            value => Err(InvariantError::ThreatOutOfRange { index, value }),
        }
    }

    /// Packs the cell into 16 bits: threat value in the low byte, state tag in bits 8..11.
    pub const fn encode(self) -> u16 {
        (self.state.tag() << 8) | self.threat_value as u16
    }

    /// Inverse of [`Cell::encode`], `None` for an unknown state tag or stray high bits.
    pub const fn decode(bits: u16) -> Option<Self> {
        if bits >> 11 != 0 {
            return None;
        }
        match CellState::from_tag(bits >> 8) {
            Some(state) => Some(Self::new(state, (bits & 0xFF) as u8)),
            None => None,
        }
    }
}

/// Exact tally of cells by [`CellState`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellStateCounts([CellCount; 5]);

impl CellStateCounts {
    pub fn tally<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut counts = Self::default();
        for cell in cells {
            counts.0[usize::from(cell.state.tag())] += 1;
        }
        counts
    }

    pub fn get(&self, state: CellState) -> CellCount {
        self[state]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellState, CellCount)> + '_ {
        CellState::ALL.into_iter().map(|state| (state, self[state]))
    }
}

impl Index<CellState> for CellStateCounts {
    type Output = CellCount;

    fn index(&self, state: CellState) -> &Self::Output {
        &self.0[usize::from(state.tag())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout() {
        assert_eq!(Cell::new(CellState::New, 0).encode(), 0x0000);
        assert_eq!(Cell::new(CellState::Open, 3).encode(), 0x0103);
        assert_eq!(Cell::new(CellState::Exploded, MINE).encode(), 0x04FF);
    }

    #[test]
    fn decode_inverts_encode_for_every_state() {
        for state in CellState::ALL {
            for threat_value in [0, 1, MAX_THREAT, MINE] {
                let cell = Cell::new(state, threat_value);
                assert_eq!(Cell::decode(cell.encode()), Some(cell));
            }
        }
    }

    #[test]
    fn decode_rejects_unknown_tags() {
        assert_eq!(Cell::decode(0x0500), None);
        assert_eq!(Cell::decode(0x0800), None);
        assert_eq!(Cell::decode(0xFFFF), None);
    }

    #[test]
    fn threat_rejects_out_of_range_counts() {
        assert_eq!(Cell::mine().threat(0), Ok(Threat::Mine));
        assert_eq!(Cell::new(CellState::New, 8).threat(0), Ok(Threat::Count(8)));
        assert_eq!(
            Cell::new(CellState::New, 9).threat(4),
            Err(InvariantError::ThreatOutOfRange { index: 4, value: 9 })
        );
    }

    #[test]
    fn tally_counts_each_state() {
        let cells = [
            Cell::new(CellState::Open, 0),
            Cell::new(CellState::Open, 1),
            Cell::new(CellState::Flagged, MINE),
            Cell::default(),
        ];

        let counts = CellStateCounts::tally(&cells);

        assert_eq!(counts[CellState::Open], 2);
        assert_eq!(counts[CellState::Flagged], 1);
        assert_eq!(counts[CellState::New], 1);
        assert_eq!(counts.get(CellState::Exploded), 0);
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<CellCount>(), 4);
    }
}
