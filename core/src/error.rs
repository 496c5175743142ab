use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::*;

/// Broken engine invariant, always reported wrapped in [`GameError::Command`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvariantError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Mine sampling gave up after {attempts} draws")]
    RunawayMineSampling { attempts: u32 },
    #[error("Flood fill reached a mine at index {index}")]
    FloodReachedMine { index: CellIndex },
    #[error("Threat value {value} at index {index} is out of range")]
    ThreatOutOfRange { index: CellIndex, value: u8 },
    #[error("Board grid does not match the game grid")]
    GridMismatch,
    #[error("Mine layout holds {actual} mines, level requires {expected}")]
    MineCountMismatch {
        expected: CellCount,
        actual: CellCount,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Invalid level: {} violation(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeError {
    #[error("Expected {expected} packed cells, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Packed cell {bits:#06x} at index {index} is not a valid cell")]
    InvalidCell { index: usize, bits: u16 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Command {command:?} failed")]
    Command {
        command: Command,
        #[source]
        cause: InvariantError,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T> = core::result::Result<T, GameError>;
