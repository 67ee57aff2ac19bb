//! Constants for board geometry, search parameters, and time budgets.
//!
//! The board is a fixed 8x8 grid so that every occupancy set fits in a
//! single `u64` bitboard.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board side length.
pub const N: usize = 8;

/// Number of squares on the board.
pub const CELLS: usize = N * N;

/// Neighbor offsets as (column delta, row delta).
/// Order: East, South, West, North
pub const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Exploration constant for UCT.
pub const UCT_C: f64 = std::f64::consts::SQRT_2;

/// Default iteration cap. In play the time budget is always hit first.
pub const MAX_ITERATIONS: usize = 10_000_000;

/// Iteration cap used by the `bench` subcommand.
pub const BENCH_ITERATIONS: usize = 5_000;

/// Maximum number of actions a single playout may apply.
///
/// Every action removes one piece from the board, so a game can never last
/// longer than the number of squares.
pub const MAX_PLAYOUT_DEPTH: usize = CELLS;

/// Initial capacity of action buffers (upper bound on legal actions).
pub const ACTION_CAPACITY: usize = 128;

// =============================================================================
// Time Budgets
// =============================================================================

/// Per-turn budget when playing through the referee protocol.
pub const MAX_TIME_MS: u64 = 135;

/// Per-turn budget for local analysis.
pub const MAX_TIME_MS_LOCAL: u64 = 10 * 1000;

// =============================================================================
// Opening Position
// =============================================================================

/// White pieces of the full checkerboard opening.
pub const INITIAL_WHITE: u64 =
    0b1010101001010101101010100101010110101010010101011010101001010101;

/// Black pieces of the full checkerboard opening.
pub const INITIAL_BLACK: u64 =
    0b0101010110101010010101011010101001010101101010100101010110101010;
