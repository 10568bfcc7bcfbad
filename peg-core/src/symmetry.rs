//! The eight symmetries of the square board and the symmetric hash weights.
//!
//! Every symmetry maps the cross-shaped board onto itself, so a peg layout
//! and any of its rotations or reflections describe the same position when
//! symmetric play is allowed.

use crate::board::{bits, index, SIZE};

/// Rotations and reflections of the 9x9 grid (the dihedral group D4).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Symmetry {
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
    Transpose,
    AntiTranspose,
}

impl Symmetry {
    pub const ALL: [Symmetry; 8] = [
        Symmetry::Identity,
        Symmetry::Rotate90,
        Symmetry::Rotate180,
        Symmetry::Rotate270,
        Symmetry::FlipHorizontal,
        Symmetry::FlipVertical,
        Symmetry::Transpose,
        Symmetry::AntiTranspose,
    ];

    /// Where the cell `(row, col)` ends up under this symmetry.
    #[inline]
    pub fn map(self, row: usize, col: usize) -> (usize, usize) {
        const N: usize = SIZE - 1;
        match self {
            Symmetry::Identity => (row, col),
            Symmetry::Rotate90 => (col, N - row),
            Symmetry::Rotate180 => (N - row, N - col),
            Symmetry::Rotate270 => (N - col, row),
            Symmetry::FlipHorizontal => (row, N - col),
            Symmetry::FlipVertical => (N - row, col),
            Symmetry::Transpose => (col, row),
            Symmetry::AntiTranspose => (N - col, N - row),
        }
    }

    /// Move every set bit of a cell mask to its image cell.
    pub fn permute(self, mask: u128) -> u128 {
        if self == Symmetry::Identity {
            return mask;
        }
        let mut out = 0u128;
        for idx in bits(mask) {
            let (row, col) = self.map(idx / SIZE, idx % SIZE);
            out |= 1u128 << index(row, col);
        }
        out
    }

    pub fn name(self) -> &'static str {
        match self {
            Symmetry::Identity => "identity",
            Symmetry::Rotate90 => "rotate-90",
            Symmetry::Rotate180 => "rotate-180",
            Symmetry::Rotate270 => "rotate-270",
            Symmetry::FlipHorizontal => "flip-horizontal",
            Symmetry::FlipVertical => "flip-vertical",
            Symmetry::Transpose => "transpose",
            Symmetry::AntiTranspose => "anti-transpose",
        }
    }
}

/// Orbit of a cell under D4, indexed by its offset from the centre.
///
/// Cross-board cells fall into nine orbits, numbered by `(min, max)` of the
/// absolute row/column offsets: (0,0) (0,1) (1,1) (0,2) (1,2) (0,3) (1,3)
/// (0,4) (1,4). Cells outside the cross get no orbit.
const fn orbit(row: usize, col: usize) -> Option<u32> {
    let dr = if row > 4 { row - 4 } else { 4 - row };
    let dc = if col > 4 { col - 4 } else { 4 - col };
    let (lo, hi) = if dr < dc { (dr, dc) } else { (dc, dr) };
    match (lo, hi) {
        (0, 0) => Some(0),
        (0, 1) => Some(1),
        (1, 1) => Some(2),
        (0, 2) => Some(3),
        (1, 2) => Some(4),
        (0, 3) => Some(5),
        (1, 3) => Some(6),
        (0, 4) => Some(7),
        (1, 4) => Some(8),
        _ => None,
    }
}

const fn build_weights() -> [u64; SIZE * SIZE] {
    let mut weights = [0u64; SIZE * SIZE];
    let mut row = 0;
    while row < SIZE {
        let mut col = 0;
        while col < SIZE {
            if let Some(k) = orbit(row, col) {
                // 4 bits per orbit; no orbit holds more than 8 cells
                weights[row * SIZE + col] = 1u64 << (4 * k);
            }
            col += 1;
        }
        row += 1;
    }
    weights
}

/// Per-cell hash weights. Equal for all cells of an orbit, so the weighted
/// peg sum is invariant under every [`Symmetry`]. Each orbit owns a 4-bit
/// digit, which makes the sum an exact per-orbit peg count on the cross.
pub const HASH_WEIGHTS: [u64; SIZE * SIZE] = build_weights();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_is_bijection() {
        for sym in Symmetry::ALL {
            let mut seen = [false; SIZE * SIZE];
            for row in 0..SIZE {
                for col in 0..SIZE {
                    let (r, c) = sym.map(row, col);
                    assert!(!seen[index(r, c)], "{:?} maps two cells to ({}, {})", sym, r, c);
                    seen[index(r, c)] = true;
                }
            }
        }
    }

    #[test]
    fn test_rotate_four_times_is_identity() {
        let (mut r, mut c) = (1, 3);
        for _ in 0..4 {
            (r, c) = Symmetry::Rotate90.map(r, c);
        }
        assert_eq!((r, c), (1, 3));
        assert_eq!(Symmetry::Rotate90.map(0, 3), (3, 8));
    }

    #[test]
    fn test_weights_symmetric() {
        for sym in Symmetry::ALL {
            for row in 0..SIZE {
                for col in 0..SIZE {
                    let (r, c) = sym.map(row, col);
                    assert_eq!(HASH_WEIGHTS[index(row, col)], HASH_WEIGHTS[index(r, c)]);
                }
            }
        }
    }

    #[test]
    fn test_weights_zero_outside_cross() {
        assert_eq!(HASH_WEIGHTS[index(0, 0)], 0);
        assert_eq!(HASH_WEIGHTS[index(2, 2)], 0);
        assert_eq!(HASH_WEIGHTS[index(4, 4)], 1);
        assert_eq!(HASH_WEIGHTS[index(0, 3)], HASH_WEIGHTS[index(5, 8)]);
    }

    #[test]
    fn test_permute_identity_and_inverse() {
        let mask = (1u128 << index(0, 3)) | (1u128 << index(4, 7));
        assert_eq!(Symmetry::Identity.permute(mask), mask);
        let once = Symmetry::Transpose.permute(mask);
        assert_ne!(once, mask);
        assert_eq!(Symmetry::Transpose.permute(once), mask);
    }
}
