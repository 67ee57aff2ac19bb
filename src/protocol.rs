//! Referee turn protocol.
//!
//! The referee sends whitespace-separated tokens on stdin:
//!
//! - once: board size (must be 8) and our color (`w` or `b`)
//! - every turn: 8 board rows of `.`/`w`/`b`, the opponent's last action
//!   (`null` on the first turn) and the number of legal actions
//!
//! We answer each turn with one line: the action followed by its visit
//! count, e.g. `b3b4 42.00`. The turn clock starts when the first board row
//! of the turn has been read.
//!
//! ## Example
//!
//! ```ignore
//! use bitboard_mcts::mcts::SearchConfig;
//! use bitboard_mcts::protocol::Engine;
//! let mut engine = Engine::new(SearchConfig::default());
//! engine.run(std::io::stdin().lock(), std::io::stdout())?;
//! ```

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::time::Instant;

use log::{info, warn};
use thiserror::Error;

use crate::constants::N;
use crate::error::{BoardError, EngineError};
use crate::mcts::{search, SearchConfig, SearchResult};
use crate::position::{legal_actions, Action, Player, State};

/// Malformed or truncated referee input, or a failed search.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("unsupported board size {0:?}, only {N} is supported")]
    UnsupportedBoardSize(String),

    #[error("invalid color {0:?}, expected 'w' or 'b'")]
    InvalidColor(String),

    #[error("malformed board: {0}")]
    Board(#[from] BoardError),

    #[error("invalid action {0:?}")]
    InvalidAction(String),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("search failed: {0}")]
    Engine(#[from] EngineError),
}

/// Splits a reader into whitespace-separated tokens, across lines.
struct Tokens<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// Next token, or `None` at end of input.
    fn next_token(&mut self) -> Result<Option<String>, io::Error> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.pending.pop_front())
    }

    fn expect(&mut self, what: &'static str) -> Result<String, ProtocolError> {
        self.next_token()?.ok_or(ProtocolError::UnexpectedEof(what))
    }
}

/// One turn's worth of referee input.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    pub state: State,
    /// When the first board row arrived
    pub start: Instant,
    /// The opponent's last action, `None` on the first turn
    pub last_action: Option<Action>,
    /// Legal action count claimed by the referee
    pub actions_count: usize,
}

/// Protocol engine state.
pub struct Engine {
    config: SearchConfig,
    rng: fastrand::Rng,
    /// Ply counter, stored in each parsed state
    turn: u32,
}

impl Engine {
    pub fn new(config: SearchConfig) -> Self {
        let rng = config.rng();
        Self {
            config,
            rng,
            turn: 0,
        }
    }

    /// Run the turn loop until the input ends at a turn boundary.
    ///
    /// Returns the number of turns played.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<usize, ProtocolError> {
        let mut tokens = Tokens::new(input);
        let player = Self::read_header(&mut tokens)?;
        info!("playing as {player}");

        let mut played = 0;
        while let Some(turn) = self.read_turn(&mut tokens, player)? {
            let result = self.play_turn(&turn)?;
            writeln!(output, "{} {:.2}", result.action, result.visits as f64)?;
            output.flush()?;
            played += 1;
        }
        Ok(played)
    }

    /// Read the board size and our color.
    fn read_header<R: BufRead>(tokens: &mut Tokens<R>) -> Result<Player, ProtocolError> {
        let size = tokens.expect("board size")?;
        match size.parse::<usize>() {
            Ok(n) if n == N => {}
            _ => return Err(ProtocolError::UnsupportedBoardSize(size)),
        }

        let color = tokens.expect("color")?;
        let mut chars = color.chars();
        match (chars.next().and_then(Player::from_char), chars.next()) {
            (Some(player), None) => Ok(player),
            _ => Err(ProtocolError::InvalidColor(color)),
        }
    }

    /// Read one turn. Returns `None` if the input ends before the board.
    fn read_turn<R: BufRead>(
        &mut self,
        tokens: &mut Tokens<R>,
        player: Player,
    ) -> Result<Option<Turn>, ProtocolError> {
        let Some(first) = tokens.next_token()? else {
            return Ok(None);
        };
        let start = Instant::now();

        let mut rows = Vec::with_capacity(N);
        rows.push(first);
        for _ in 1..N {
            rows.push(tokens.expect("board row")?);
        }
        let mut state = State::from_rows(&rows, player)?;

        let last = tokens.expect("last action")?;
        let last_action = if last == "null" {
            None
        } else {
            Some(Action::parse(&last).ok_or(ProtocolError::InvalidAction(last))?)
        };

        let count = tokens.expect("action count")?;
        let actions_count = count
            .parse::<usize>()
            .map_err(|_| ProtocolError::InvalidNumber(count))?;

        self.turn += 1;
        if last_action.is_none() {
            self.turn = 1;
        }
        state.turn = self.turn;

        Ok(Some(Turn {
            state,
            start,
            last_action,
            actions_count,
        }))
    }

    /// Search one turn and advance the ply counter past our move.
    pub fn play_turn(&mut self, turn: &Turn) -> Result<SearchResult, ProtocolError> {
        let ours = legal_actions(&turn.state).len();
        if ours != turn.actions_count {
            warn!(
                "referee reports {} legal actions, generated {}",
                turn.actions_count, ours
            );
        }

        let deadline = self.config.deadline(turn.start);
        let result = search(
            &turn.state,
            deadline,
            self.config.max_iterations,
            &mut self.rng,
        )?;
        info!(
            "turn {}: {} visits {} after {} iterations, {} playouts, {} nodes in {} ms",
            turn.state.turn,
            result.action,
            result.visits,
            result.iterations,
            result.playouts,
            result.nodes,
            result.elapsed.as_millis()
        );

        self.turn += 1;
        Ok(result)
    }
}
