//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal actions until the side to move is
//! stuck, then reports the winner. Playouts always run to completion; the
//! search deadline is only checked between iterations.

use crate::constants::{ACTION_CAPACITY, MAX_PLAYOUT_DEPTH};
use crate::error::EngineError;
use crate::position::{gen_actions, Action, Player, State};

/// Play random actions from `state` until one side cannot move.
///
/// Works on a copy; the caller's state is untouched. Returns the winner,
/// which is always the opponent of the side left without a move.
///
/// # Errors
/// [`EngineError::PlayoutTooDeep`] if more than [`MAX_PLAYOUT_DEPTH`] actions
/// would be needed. Each action removes one piece, so this signals a bug in
/// move generation rather than a long game.
pub fn playout(state: &State, rng: &mut fastrand::Rng) -> Result<Player, EngineError> {
    let mut actions = Vec::with_capacity(ACTION_CAPACITY);
    playout_with_buffer(*state, rng, &mut actions)
}

/// Same as [`playout`] but reuses a caller-owned action buffer.
pub fn playout_with_buffer(
    mut state: State,
    rng: &mut fastrand::Rng,
    actions: &mut Vec<Action>,
) -> Result<Player, EngineError> {
    let mut depth = 0;
    loop {
        gen_actions(&state, actions);
        if actions.is_empty() {
            return Ok(state.player.opponent());
        }
        if depth == MAX_PLAYOUT_DEPTH {
            return Err(EngineError::PlayoutTooDeep {
                depth: MAX_PLAYOUT_DEPTH,
            });
        }
        state.apply(actions[rng.usize(..actions.len())]);
        depth += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_state_returns_opponent() {
        let state = State::from_rows(
            &[
                "b.......", "........", "........", "........", "........", "........",
                "........", ".......w",
            ],
            Player::Black,
        )
        .unwrap();
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(playout(&state, &mut rng), Ok(Player::White));
    }

    #[test]
    fn test_single_forced_capture() {
        // White takes the only black piece; black is then stuck.
        let state = State::from_rows(
            &[
                "wb......", "........", "........", "........", "........", "........",
                "........", "........",
            ],
            Player::White,
        )
        .unwrap();
        let mut rng = fastrand::Rng::with_seed(7);
        assert_eq!(playout(&state, &mut rng), Ok(Player::White));
    }

    #[test]
    fn test_caller_state_untouched() {
        let state = State::initial();
        let before = state;
        let mut rng = fastrand::Rng::with_seed(42);
        playout(&state, &mut rng).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_playouts_terminate_within_cap() {
        let mut rng = fastrand::Rng::with_seed(2024);
        let mut actions = Vec::new();
        for _ in 0..200 {
            let result = playout_with_buffer(State::initial(), &mut rng, &mut actions);
            assert!(result.is_ok());
        }
    }

    #[test]
    fn test_seeded_playout_is_deterministic() {
        let state = State::initial();
        let a = playout(&state, &mut fastrand::Rng::with_seed(99));
        let b = playout(&state, &mut fastrand::Rng::with_seed(99));
        assert_eq!(a, b);
    }
}
