//! Bitboard game state and move generation.
//!
//! The board is three `u64` occupancy sets (empty, white, black) that always
//! partition the 64 squares. A move takes an orthogonally adjacent enemy
//! piece: the destination changes color and the origin square is vacated,
//! so every move removes exactly one piece from the board. A side with no
//! legal move has lost.

use std::fmt;

use crate::constants::{ACTION_CAPACITY, CELLS, INITIAL_BLACK, INITIAL_WHITE, N};
use crate::error::{BoardError, EngineError};
use crate::tables::{mask, neighbors, Square};

/// Occupancy bitboards indexed by [`Cell`].
pub type Grid = [u64; 3];

/// Contents of a square.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty = 0,
    White = 1,
    Black = 2,
}

impl Cell {
    /// Parse a protocol board character (`.`, `w` or `b`).
    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            '.' => Some(Cell::Empty),
            'w' => Some(Cell::White),
            'b' => Some(Cell::Black),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::White => 'w',
            Cell::Black => 'b',
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    White,
    Black,
}

impl Player {
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// The cell color this player's pieces occupy.
    #[inline]
    pub fn cell(self) -> Cell {
        match self {
            Player::White => Cell::White,
            Player::Black => Cell::Black,
        }
    }

    /// Parse a protocol color token (`w` or `b`).
    pub fn from_char(c: char) -> Option<Player> {
        match c {
            'w' => Some(Player::White),
            'b' => Some(Player::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::White => write!(f, "white"),
            Player::Black => write!(f, "black"),
        }
    }
}

/// A move from one square onto an adjacent enemy square.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Action {
    pub from: Square,
    pub to: Square,
}

impl Action {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    /// Parse the four-character form used on the wire, e.g. `b3b4`.
    pub fn parse(s: &str) -> Option<Action> {
        if s.len() != 4 || !s.is_ascii() {
            return None;
        }
        let from = parse_coord(&s[..2])?;
        let to = parse_coord(&s[2..])?;
        Some(Action { from, to })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", str_coord(self.from), str_coord(self.to))
    }
}

/// A game position.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// Occupancy sets, indexed by `Cell as usize`
    pub grid: Grid,
    /// Number of actions applied so far (diagnostics only)
    pub turn: u32,
    /// Side to move
    pub player: Player,
}

impl State {
    /// Build a state from raw occupancy sets, checking that they partition
    /// the board.
    pub fn from_grid(grid: Grid, turn: u32, player: Player) -> Result<Self, EngineError> {
        let [empty, white, black] = grid;
        let overlap = (empty & white) | (empty & black) | (white & black);
        let uncovered = !(empty | white | black);
        if overlap != 0 || uncovered != 0 {
            return Err(EngineError::BrokenPartition { overlap, uncovered });
        }
        Ok(Self { grid, turn, player })
    }

    /// Build a state from white and black pieces; every other square is empty.
    pub fn from_pieces(white: u64, black: u64, player: Player) -> Result<Self, EngineError> {
        Self::from_grid([!(white | black), white, black], 0, player)
    }

    /// The full checkerboard opening, white to move.
    pub fn initial() -> Self {
        Self {
            grid: [0, INITIAL_WHITE, INITIAL_BLACK],
            turn: 0,
            player: Player::White,
        }
    }

    /// Build a state from 8 rows of `.`/`w`/`b`, top row first.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], player: Player) -> Result<Self, BoardError> {
        if rows.len() != N {
            return Err(BoardError::BadRowCount(rows.len()));
        }
        let mut grid: Grid = [0; 3];
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let len = line.chars().count();
            if len != N {
                return Err(BoardError::BadRowLength { row, len });
            }
            for (col, c) in line.chars().enumerate() {
                let cell =
                    Cell::from_char(c).ok_or(BoardError::InvalidCell { row, col, cell: c })?;
                grid[cell as usize] |= mask((row * N + col) as Square);
            }
        }
        Ok(Self {
            grid,
            turn: 0,
            player,
        })
    }

    #[inline]
    pub fn is_taken_by(&self, cell: Cell, sq: Square) -> bool {
        self.grid[cell as usize] & mask(sq) != 0
    }

    /// What occupies a square.
    pub fn cell_at(&self, sq: Square) -> Cell {
        if self.is_taken_by(Cell::White, sq) {
            Cell::White
        } else if self.is_taken_by(Cell::Black, sq) {
            Cell::Black
        } else {
            Cell::Empty
        }
    }

    /// Number of squares holding `cell`.
    #[inline]
    pub fn count(&self, cell: Cell) -> u32 {
        self.grid[cell as usize].count_ones()
    }

    /// True if every square is in exactly one occupancy set.
    pub fn is_partitioned(&self) -> bool {
        let [empty, white, black] = self.grid;
        (empty & white) | (empty & black) | (white & black) == 0
            && empty | white | black == u64::MAX
    }

    #[inline]
    fn set(&mut self, cell: Cell, sq: Square) {
        self.grid[cell as usize] |= mask(sq);
    }

    #[inline]
    fn unset(&mut self, cell: Cell, sq: Square) {
        self.grid[cell as usize] &= !mask(sq);
    }

    /// Apply an action for the side to move.
    ///
    /// The action must come from [`gen_actions`] for this state; it is not
    /// re-validated here.
    pub fn apply(&mut self, action: Action) {
        let mover = self.player.cell();
        let opponent = self.player.opponent().cell();

        self.set(Cell::Empty, action.from);
        self.unset(mover, action.from);

        self.set(mover, action.to);
        self.unset(opponent, action.to);

        self.turn += 1;
        self.player = self.player.opponent();
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..N {
            write!(f, "{} ", N - row)?;
            for col in 0..N {
                write!(f, "{}", self.cell_at((row * N + col) as Square).to_char())?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for col in 0..N {
            write!(f, "{}", (b'a' + col as u8) as char)?;
        }
        writeln!(f)?;
        write!(f, "{} to move, turn {}", self.player, self.turn)
    }
}

/// Fill `actions` with every legal action for the side to move.
///
/// Order: origin square ascending, then neighbor direction order
/// (East, South, West, North). The buffer is cleared first.
pub fn gen_actions(state: &State, actions: &mut Vec<Action>) {
    actions.clear();

    let own = state.grid[state.player.cell() as usize];
    let enemy = state.grid[state.player.opponent().cell() as usize];

    let mut pieces = own;
    while pieces != 0 {
        let from = pieces.trailing_zeros() as Square;
        pieces &= pieces - 1;
        for &to in neighbors(from) {
            if enemy & mask(to) != 0 {
                actions.push(Action { from, to });
            }
        }
    }
}

/// Every legal action for the side to move, in generation order.
pub fn legal_actions(state: &State) -> Vec<Action> {
    let mut actions = Vec::with_capacity(ACTION_CAPACITY);
    gen_actions(state, &mut actions);
    actions
}

/// True if the side to move has no legal action (and has therefore lost).
pub fn is_terminal(state: &State) -> bool {
    let enemy = state.grid[state.player.opponent().cell() as usize];
    let mut pieces = state.grid[state.player.cell() as usize];
    while pieces != 0 {
        let from = pieces.trailing_zeros() as Square;
        pieces &= pieces - 1;
        if neighbors(from).iter().any(|&to| enemy & mask(to) != 0) {
            return false;
        }
    }
    true
}

/// Convert a square to a string like `a8` (column letter, row number with
/// row 0 printed as 8).
pub fn str_coord(sq: Square) -> String {
    let col = (b'a' + sq % N as u8) as char;
    let row = N - (sq as usize / N);
    format!("{col}{row}")
}

/// Parse a coordinate string like `a8` into a square.
pub fn parse_coord(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let col = chars.next()?;
    let row: usize = chars.as_str().parse().ok()?;
    if !('a'..='h').contains(&col) || !(1..=N).contains(&row) {
        return None;
    }
    let col = col as usize - 'a' as usize;
    let sq = (N - row) * N + col;
    debug_assert!(sq < CELLS);
    Some(sq as Square)
}
