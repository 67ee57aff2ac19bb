//! Precomputed lookup tables for move generation.
//!
//! ## Bit masks
//! `MASKS[i]` is the single-bit mask of square `i`, so hot loops never
//! recompute shifts.
//!
//! ## Adjacency
//! For every square, the orthogonal neighbors that stay on the board, in
//! East, South, West, North order. Both tables are built once on first use
//! and shared read-only for the rest of the process.

use std::sync::OnceLock;

use crate::constants::{CELLS, DIRECTIONS, N};

/// A square index, `0..64`, row-major with row 0 at the top.
pub type Square = u8;

/// The neighbors of one square. Corners have 2, edges 3, the rest 4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    squares: [Square; 4],
    len: u8,
}

impl Neighbors {
    fn push(&mut self, sq: Square) {
        self.squares[self.len as usize] = sq;
        self.len += 1;
    }

    /// The neighbor squares in direction order.
    #[inline]
    pub fn as_slice(&self) -> &[Square] {
        &self.squares[..self.len as usize]
    }
}

static MASKS: OnceLock<[u64; CELLS]> = OnceLock::new();
static NEIGHBORS: OnceLock<[Neighbors; CELLS]> = OnceLock::new();

/// Single-bit mask for a square.
#[inline]
pub fn mask(sq: Square) -> u64 {
    MASKS.get_or_init(make_masks)[sq as usize]
}

/// On-board orthogonal neighbors of a square.
#[inline]
pub fn neighbors(sq: Square) -> &'static [Square] {
    NEIGHBORS.get_or_init(make_neighbors)[sq as usize].as_slice()
}

/// Force both tables to be built now rather than inside the first search.
pub fn init() {
    MASKS.get_or_init(make_masks);
    NEIGHBORS.get_or_init(make_neighbors);
}

fn make_masks() -> [u64; CELLS] {
    std::array::from_fn(|i| 1u64 << i)
}

fn make_neighbors() -> [Neighbors; CELLS] {
    let mut table = [Neighbors::default(); CELLS];
    for (idx, entry) in table.iter_mut().enumerate() {
        let row = (idx / N) as isize;
        let col = (idx % N) as isize;
        for &(dx, dy) in &DIRECTIONS {
            let x = col + dx;
            let y = row + dy;
            if x < 0 || x >= N as isize || y < 0 || y >= N as isize {
                continue;
            }
            entry.push((y * N as isize + x) as Square);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_are_single_bits() {
        for sq in 0..CELLS as Square {
            assert_eq!(mask(sq).count_ones(), 1);
            assert_eq!(mask(sq).trailing_zeros(), sq as u32);
        }
    }

    #[test]
    fn test_corner_neighbors() {
        // Top-left: east then south
        assert_eq!(neighbors(0), &[1, 8]);
        // Top-right: south then west
        assert_eq!(neighbors(7), &[15, 6]);
        // Bottom-left: east then north
        assert_eq!(neighbors(56), &[57, 48]);
        // Bottom-right: west then north
        assert_eq!(neighbors(63), &[62, 55]);
    }

    #[test]
    fn test_center_neighbors_order() {
        // Square 27 = row 3, column 3
        assert_eq!(neighbors(27), &[28, 35, 26, 19]);
    }

    #[test]
    fn test_neighbor_counts() {
        let total: usize = (0..CELLS as Square).map(|sq| neighbors(sq).len()).sum();
        // 4 corners * 2 + 24 edge squares * 3 + 36 inner squares * 4
        assert_eq!(total, 4 * 2 + 24 * 3 + 36 * 4);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        for sq in 0..CELLS as Square {
            for &n in neighbors(sq) {
                assert!(neighbors(n).contains(&sq), "{n} should list {sq}");
            }
        }
    }
}
