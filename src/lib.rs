//! Bitboard MCTS: a move-selection engine for an 8x8 conversion-capture game.
//!
//! Each side moves a piece onto an orthogonally adjacent enemy piece,
//! converting it and vacating the origin square. A side with no such move
//! loses. The engine picks moves with a time-bounded Monte Carlo Tree Search
//! over `u64` bitboards.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, search parameters and time budgets
//! - [`tables`] - Precomputed bit masks and adjacency lists
//! - [`position`] - Game state, action application and move generation
//! - [`playout`] - Random game simulation
//! - [`mcts`] - Arena-based Monte Carlo Tree Search with UCT
//! - [`protocol`] - Referee turn protocol on stdin/stdout
//! - [`error`] - Core error types
//! - [`logging`] - Logger setup
//!
//! ## Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use bitboard_mcts::mcts::search;
//! use bitboard_mcts::position::State;
//!
//! let state = State::initial();
//! let deadline = Instant::now() + Duration::from_millis(50);
//! let mut rng = fastrand::Rng::with_seed(1);
//! let result = search(&state, deadline, 1_000, &mut rng).unwrap();
//! println!("Best action: {} ({} visits)", result.action, result.visits);
//! ```

pub mod constants;
pub mod error;
pub mod logging;
pub mod mcts;
pub mod playout;
pub mod position;
pub mod protocol;
pub mod tables;
