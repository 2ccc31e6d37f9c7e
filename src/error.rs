//! Error types for the crate

use thiserror::Error;

use crate::gym::grid_world::State;

/// Main error type for the crate
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("can't move from {state}: the cell is not actionable")]
    InvalidMove { state: State },

    #[error("invalid value for `move_prob`: {value} (must be in the interval (0, 1])")]
    InvalidMoveProb { value: f64 },

    #[error("grid has no cells")]
    EmptyGrid,

    #[error("grid is not rectangular: row {row} has {got} cells, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("invalid cell code {code} (expected one of 0, 1, -1, 9)")]
    InvalidCell { code: i32 },

    #[error("start position {state} is a blocked cell")]
    BlockedStart { state: State },

    #[error("invalid history label '{input}'")]
    InvalidHistory { input: String },
}

/// Result alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
