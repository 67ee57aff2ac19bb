//! Error values raised by the game core.
//!
//! None of these are recoverable game conditions: each one means a caller
//! broke a precondition or the engine hit a latent bug.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The empty/white/black sets overlap or leave squares uncovered.
    #[error("occupancy sets do not partition the board (overlap {overlap:#018x}, uncovered {uncovered:#018x})")]
    BrokenPartition { overlap: u64, uncovered: u64 },

    /// Search was asked to move from a position where the mover is stuck.
    #[error("no legal actions for the side to move")]
    NoLegalActions,

    /// A playout needed more actions than there are squares.
    #[error("playout exceeded the depth cap of {depth} actions")]
    PlayoutTooDeep { depth: usize },
}

/// A textual board that cannot be turned into a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board has {0} rows, expected 8")]
    BadRowCount(usize),

    #[error("board row {row} has {len} cells, expected 8")]
    BadRowLength { row: usize, len: usize },

    #[error("invalid cell {cell:?} at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, cell: char },
}
